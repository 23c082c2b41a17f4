use alloc::vec::Vec;
use core::fmt;

const DIGIT_SPAN: u64 = 1 << 32;

/// A stable ordering token for grid items.
///
/// Feed-appended items get integer keys (`whole`, empty fraction). Items inserted mid-column get a
/// key strictly between their predecessor and the next key in global order. The fraction is an
/// unbounded base-2^32 digit string, so repeated subdivision of the same interval never runs out
/// of precision and never collides.
///
/// Generated fractions never end in a zero digit; this keeps lexicographic order (the derived
/// `Ord`) equal to numeric order.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderKey {
    whole: u64,
    frac: Vec<u32>,
}

impl OrderKey {
    /// The smallest key. It is never assigned to an item.
    pub const MIN: OrderKey = OrderKey {
        whole: 0,
        frac: Vec::new(),
    };

    pub fn integer(whole: u64) -> Self {
        Self {
            whole,
            frac: Vec::new(),
        }
    }

    pub fn whole(&self) -> u64 {
        self.whole
    }

    pub fn is_integer(&self) -> bool {
        self.frac.is_empty()
    }

    /// Number of fractional digits (how often an interval was subdivided to reach this key).
    pub fn depth(&self) -> usize {
        self.frac.len()
    }

    /// Lossy approximation, only meant for display/debugging.
    pub fn to_f64(&self) -> f64 {
        let mut value = self.whole as f64;
        let mut scale = 1.0;
        for &digit in &self.frac {
            scale /= DIGIT_SPAN as f64;
            value += digit as f64 * scale;
        }
        value
    }

    /// Returns a key strictly greater than `lo` and, when given, strictly less than `hi`.
    ///
    /// `hi` must be greater than `lo`.
    pub fn between(lo: &OrderKey, hi: Option<&OrderKey>) -> OrderKey {
        debug_assert!(
            hi.is_none_or(|hi| lo < hi),
            "OrderKey::between: upper bound must exceed lower bound"
        );
        // A larger whole part leaves the fraction unconstrained.
        let mut upper = hi
            .filter(|hi| hi.whole == lo.whole)
            .map(|hi| hi.frac.as_slice());
        let mut frac = Vec::with_capacity(lo.frac.len() + 1);
        let mut i = 0usize;
        loop {
            if upper.is_some_and(|u| i >= u.len() && i >= lo.frac.len()) {
                // Bounds are equal from here on; nothing fits strictly between them.
                upper = None;
            }
            let l = lo.frac.get(i).map_or(0, |&d| u64::from(d));
            let h = match upper {
                Some(u) => u.get(i).map_or(0, |&d| u64::from(d)),
                None => DIGIT_SPAN,
            };
            if h > l + 1 {
                frac.push(((l + h) / 2) as u32);
                break;
            }
            frac.push(l as u32);
            if h != l {
                upper = None;
            }
            i += 1;
        }
        OrderKey {
            whole: lo.whole,
            frac,
        }
    }
}

impl fmt::Debug for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frac.is_empty() {
            return write!(f, "OrderKey({})", self.whole);
        }
        write!(f, "OrderKey({}.", self.whole)?;
        for (i, digit) in self.frac.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{digit:08x}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}
