use chrono::NaiveDate;

/// Source of increasing invoice numbers.
pub trait SequenceGenerator {
    fn next(&mut self) -> u64;
}

/// In-memory sequence starting after `last`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counter {
    last: u64,
}

impl Counter {
    /// The first `next()` returns `last + 1`.
    pub fn starting_after(last: u64) -> Self {
        Counter { last }
    }

    pub fn last(&self) -> u64 {
        self.last
    }
}

impl SequenceGenerator for Counter {
    fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

impl<S: SequenceGenerator + ?Sized> SequenceGenerator for &mut S {
    fn next(&mut self) -> u64 {
        (**self).next()
    }
}

/// Formats ids as `INV-YYYYMMDD-NNNN`.
#[derive(Debug, Clone)]
pub struct InvoiceIdGenerator<S> {
    sequence: S,
}

impl<S: SequenceGenerator> InvoiceIdGenerator<S> {
    pub fn new(sequence: S) -> Self {
        InvoiceIdGenerator { sequence }
    }

    /// Draw the next number and format it for `date`. Numbers past
    /// 9999 keep all their digits.
    pub fn next_id(&mut self, date: NaiveDate) -> String {
        let n = self.sequence.next();
        format!("INV-{}-{:04}", date.format("%Y%m%d"), n)
    }

    pub fn into_inner(self) -> S {
        self.sequence
    }
}
