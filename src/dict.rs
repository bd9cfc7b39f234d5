use std::collections::HashMap;

pub trait Dictionary {
    fn observe(&mut self, token: &str);
    fn count(&self, token: &str) -> usize;
}

#[derive(Clone, Debug)]
struct TokenEntry {
    token: String,
    count: usize,
}

/// Token frequencies that remember the order tokens were first observed in.
#[derive(Clone, Default, Debug)]
pub struct OrderedDictionary {
    slots: HashMap<String, usize>,
    entries: Vec<TokenEntry>,
}

impl OrderedDictionary {
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// `(token, count)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|e| (e.token.as_str(), e.count))
    }
    /// Up to `top_k` tokens by descending count; ties keep first-seen order.
    pub fn most_common(&self, top_k: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<&TokenEntry> = self.entries.iter().collect();
        // `sort_by` is stable, which is what breaks ties by arrival.
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
            .into_iter()
            .take(top_k)
            .map(|e| (e.token.clone(), e.count))
            .collect()
    }
}

impl Dictionary for OrderedDictionary {
    fn observe(&mut self, token: &str) {
        match self.slots.get(token) {
            Some(&slot) => self.entries[slot].count += 1,
            None => {
                self.slots.insert(token.to_string(), self.entries.len());
                self.entries.push(TokenEntry {
                    token: token.to_string(),
                    count: 1,
                });
            }
        }
    }
    fn count(&self, token: &str) -> usize {
        self.slots
            .get(token)
            .map(|&slot| self.entries[slot].count)
            .unwrap_or(0)
    }
}
