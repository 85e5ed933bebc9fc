/// Fuzzy-hash algorithm behind a trait seam. No maintained, pure-Rust
/// ssdeep/tlsh crate exists in this stack (see DESIGN.md); `NullFuzzyHasher`
/// is the shipped default and simply records that an algorithm was
/// requested without producing a real digest. A real implementation can
/// be dropped in later without touching the pipeline.
pub trait FuzzyHasher: Send {
    fn algorithm_name(&self) -> &'static str;
    fn update(&mut self, bytes: &[u8]);
    fn finish(self: Box<Self>) -> Option<String>;
}

#[derive(Default)]
pub struct NullFuzzyHasher {
    name: &'static str,
    requested: bool,
}

impl NullFuzzyHasher {
    pub fn ssdeep() -> Self {
        Self {
            name: "ssdeep",
            requested: true,
        }
    }

    pub fn tlsh() -> Self {
        Self {
            name: "tlsh",
            requested: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            name: "",
            requested: false,
        }
    }
}

impl FuzzyHasher for NullFuzzyHasher {
    fn algorithm_name(&self) -> &'static str {
        self.name
    }

    fn update(&mut self, _bytes: &[u8]) {}

    fn finish(self: Box<Self>) -> Option<String> {
        // A real implementation would return Some(digest). This stub
        // never does, even when requested=true, so callers can see in
        // the CSV that the column was requested but came back empty
        // rather than silently omitted.
        None
    }
}
