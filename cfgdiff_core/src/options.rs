use tracing::subscriber::NoSubscriber;

/// Per-request comparison settings; nothing here is process-global
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// Keep comparator log output; when false it goes to a sink for the call
    pub verbose: bool,
    /// Write `<left>.diff` next to the left file for non-empty reports
    pub write_report: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            write_report: true,
        }
    }
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_write_report(mut self, write_report: bool) -> Self {
        self.write_report = write_report;
        self
    }

    /// Run `f`, discarding its log output unless verbose
    pub fn scoped<T>(&self, f: impl FnOnce() -> T) -> T {
        if self.verbose {
            f()
        } else {
            tracing::subscriber::with_default(NoSubscriber::default(), f)
        }
    }
}
