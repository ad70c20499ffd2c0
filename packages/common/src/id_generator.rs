/// Sequential ID generator shared by identities and stash tokens.
///
/// IDs are `<prefix><n>`, starting at zero, and never repeat for the lifetime
/// of the generator.
#[derive(Debug, Clone)]
pub struct IDGenerator {
    prefix: String,
    count: u64,
}

impl IDGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            count: 0,
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.count);
        self.count += 1;
        id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of IDs handed out so far
    pub fn issued(&self) -> u64 {
        self.count
    }
}
