/// Stylesheet functions already written to the document head.
///
/// Functions are de-duplicated by address, so two component types sharing one
/// stylesheet function produce a single `<style>` block.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    registered: Vec<fn() -> String>,
}

impl StyleRegistry {
    /// Record a stylesheet; returns false when it was already registered
    pub fn insert(&mut self, stylesheet: fn() -> String) -> bool {
        let address = stylesheet as usize;
        if self.registered.iter().any(|f| *f as usize == address) {
            return false;
        }
        self.registered.push(stylesheet);
        true
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> String {
        ".card { padding: 8px }".to_string()
    }

    fn nav() -> String {
        "nav { display: flex }".to_string()
    }

    #[test]
    fn test_dedupes_by_function() {
        let mut styles = StyleRegistry::default();
        assert!(styles.insert(card));
        assert!(styles.insert(nav));
        assert!(!styles.insert(card));
        assert_eq!(styles.len(), 2);
    }
}
