/// Progress reported by a producer.
///
/// Progress is independent from result data: a computation may report
/// progress without producing any result, and the other way around.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Progress {
    pub(crate) minimum: i64,
    pub(crate) maximum: i64,
    pub(crate) value: i64,
    pub(crate) text: String,
}

impl Progress {
    /// Sets the range. A reversed range collapses to `minimum..=minimum`.
    ///
    /// The current value is raised to `minimum` if it lies below it; it is
    /// never lowered.
    pub(crate) fn set_range(&mut self, minimum: i64, maximum: i64) {
        self.minimum = minimum;
        self.maximum = maximum.max(minimum);
        self.value = self.value.max(self.minimum);
    }

    /// Applies a new value, returning `false` if it was ignored.
    ///
    /// The value never decreases, and it must fall inside the range unless
    /// the range is empty.
    pub(crate) fn advance(&mut self, value: i64, text: Option<String>) -> bool {
        if value <= self.value && !(value == self.value && text.is_some()) {
            return false;
        }

        if self.minimum != self.maximum && (value < self.minimum || value > self.maximum) {
            return false;
        }

        self.value = value;

        if let Some(text) = text {
            self.text = text;
        }

        true
    }
}
