use tracing::debug;

const ALPHABET: usize = 26;

/// A node of the identifier trie, one child slot per letter `a..=z`
#[derive(Debug, Default)]
pub struct TrieNode {
    children: [Option<Box<TrieNode>>; ALPHABET],
    /// Full lowercased identifier when an identifier ends here
    identifier: Option<String>,
}

impl TrieNode {
    pub fn is_end_of_word(&self) -> bool {
        self.identifier.is_some()
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    fn child(&self, c: char) -> Option<&TrieNode> {
        letter_index(c).and_then(|i| self.children[i].as_deref())
    }

    /// Every identifier stored at or below this node, pre-order, children a..z
    pub fn identifiers(&self) -> Vec<&str> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Some(id) = node.identifier() {
                found.push(id);
            }
            // reversed so that 'a' is popped first
            for child in node.children.iter().rev().flatten() {
                stack.push(child);
            }
        }
        found
    }
}

fn letter_index(c: char) -> Option<usize> {
    if c.is_ascii_lowercase() {
        Some((c as u8 - b'a') as usize)
    } else {
        None
    }
}

/// Prefix tree over doctor identifiers.
///
/// Insertion skips characters outside `a..=z`, lookup does not: a query
/// containing such a character never matches.
#[derive(Debug, Default)]
pub struct IdentifierTrie {
    root: TrieNode,
    len: usize,
}

impl IdentifierTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct identifiers stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores the lowercased identifier at the end of its letter path,
    /// replacing whatever identifier ended there before. Returns false when
    /// the identifier has no letters to index, or is already present.
    pub fn insert(&mut self, identifier: &str) -> bool {
        let normalized = identifier.to_lowercase();
        let mut letters = normalized.chars().filter_map(letter_index).peekable();
        if letters.peek().is_none() {
            debug!(identifier, "identifier has no letters, not indexed");
            return false;
        }

        let mut node = &mut self.root;
        for i in letters {
            node = &mut **node.children[i].get_or_insert_with(Box::default);
        }
        match node.identifier.replace(normalized) {
            Some(previous) if node.identifier.as_deref() == Some(previous.as_str()) => false,
            Some(previous) => {
                debug!(identifier, replaced = %previous, "identifier path already taken, replaced");
                true
            }
            None => {
                self.len += 1;
                true
            }
        }
    }

    fn walk(&self, query: &str) -> Option<&TrieNode> {
        query
            .to_lowercase()
            .chars()
            .try_fold(&self.root, |node, c| node.child(c))
    }

    /// Node holding exactly `identifier`, if one ends there
    pub fn exact_lookup(&self, identifier: &str) -> Option<&TrieNode> {
        self.walk(identifier).filter(|node| node.is_end_of_word())
    }

    /// Subtree below `prefix`; enumerate it with [`TrieNode::identifiers`]
    pub fn prefix_lookup(&self, prefix: &str) -> Option<&TrieNode> {
        self.walk(prefix)
    }

    /// Convenience wrapper around `prefix_lookup` returning the suggestions
    pub fn suggestions(&self, prefix: &str) -> Vec<&str> {
        self.prefix_lookup(prefix)
            .map(TrieNode::identifiers)
            .unwrap_or_default()
    }

    /// All stored identifiers in alphabetical (pre-order) order
    pub fn identifiers(&self) -> Vec<&str> {
        self.root.identifiers()
    }
}
