/// Logs the progress of a scan every 10% of the processed rows
pub(crate) struct Progress {
    label: &'static str,
    total: usize,
    next_percentage: usize,
}

impl Progress {
    pub fn new(label: &'static str, total: usize) -> Self {
        Progress {
            label,
            total,
            next_percentage: 10,
        }
    }

    pub fn update(&mut self, done: usize) {
        if self.total == 0 {
            return;
        }

        let percentage = done * 100 / self.total;
        if percentage >= self.next_percentage {
            log::debug!("{}: {percentage}% ({done}/{} rows)", self.label, self.total);
            self.next_percentage = (percentage / 10 + 1) * 10;
        }
    }
}
