//! The weighted transaction database and its text loader.
//!
//! Transactions are kept exactly in the shape the guiding-path encoder
//! consumes them: per transaction the item literals and their weights, per
//! item the list of transactions it appears in and its total weight. The
//! tables are immutable once the cooperation layer takes ownership.

use crate::clause::{Lit, Var};
use std::io::{self, BufRead};

/// A weighted transaction database.
///
/// Items are dense `0..nb_items` internally; the textual format and all
/// output use 1-based identifiers. Item `i` maps to boolean variable `i`
/// of every worker, so transactions are stored directly as literals.
#[derive(Debug, Clone)]
pub struct TransactionDb {
    nb_items: u32,
    /// Per transaction, the (positive) item literals it contains.
    list_transactions: Vec<Vec<Lit>>,
    /// Per transaction, the weight of each item, parallel to `list_transactions`.
    w_item_trans: Vec<Vec<u64>>,
    /// Per item, the transactions it appears in.
    appear_trans: Vec<Vec<u32>>,
    /// Per item, the aggregated weight over all its occurrences.
    wocc: Vec<u64>,
}

impl TransactionDb {
    pub fn new(nb_items: u32) -> Self {
        Self {
            nb_items,
            list_transactions: vec![],
            w_item_trans: vec![],
            appear_trans: vec![vec![]; nb_items as usize],
            wocc: vec![0; nb_items as usize],
        }
    }

    /// Append a transaction given as 0-based item indices and their weights.
    ///
    /// Items must be in range and `items`/`weights` parallel; the loader is
    /// responsible for validating raw input before calling this.
    pub fn push(&mut self, items: &[u32], weights: &[u64]) {
        debug_assert_eq!(items.len(), weights.len());
        let tid = self.list_transactions.len() as u32;
        let mut lits = Vec::with_capacity(items.len());
        for (&i, &w) in items.iter().zip(weights.iter()) {
            debug_assert!(i < self.nb_items);
            lits.push(Lit::new(Var::from_idx(i), true));
            self.appear_trans[i as usize].push(tid);
            self.wocc[i as usize] += w;
        }
        self.list_transactions.push(lits);
        self.w_item_trans.push(weights.to_vec());
    }

    #[inline(always)]
    pub fn nb_items(&self) -> u32 {
        self.nb_items
    }
    #[inline(always)]
    pub fn nb_trans(&self) -> usize {
        self.list_transactions.len()
    }
    /// Item literals of transaction `t`.
    #[inline(always)]
    pub fn transaction(&self, t: u32) -> &[Lit] {
        &self.list_transactions[t as usize]
    }
    /// Item weights of transaction `t`, parallel to [`TransactionDb::transaction`].
    #[inline(always)]
    pub fn weights(&self, t: u32) -> &[u64] {
        &self.w_item_trans[t as usize]
    }
    /// Transactions containing the given item.
    #[inline(always)]
    pub fn appearances(&self, item: Var) -> &[u32] {
        &self.appear_trans[item.idx() as usize]
    }
    /// Aggregated weight of the given item over the whole database.
    #[inline(always)]
    pub fn item_weight(&self, item: Var) -> u64 {
        self.wocc[item.idx() as usize]
    }
}

/// Parse a transaction database from text.
///
/// One transaction per line; tokens are `item` or `item:weight` with
/// 1-based item identifiers and a default weight of 1. Blank lines and
/// lines starting with `c` are skipped. The number of items is the
/// largest identifier seen.
pub fn parse_db<R: BufRead>(input: &mut R) -> io::Result<TransactionDb> {
    let mut raw: Vec<(Vec<u32>, Vec<u64>)> = vec![];
    let mut max_item: u32 = 0;

    let mut line = String::new();
    let mut lineno = 0usize;
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        lineno += 1;
        let body = line.trim();
        if body.is_empty() || body.starts_with('c') {
            continue;
        }

        let mut items = vec![];
        let mut weights = vec![];
        for tok in body.split_whitespace() {
            let (item_s, weight_s) = match tok.find(':') {
                Some(i) => (&tok[..i], Some(&tok[i + 1..])),
                None => (tok, None),
            };
            let item: u32 = item_s
                .parse()
                .map_err(|_| parse_error(lineno, tok, "bad item identifier"))?;
            if item == 0 {
                return Err(parse_error(lineno, tok, "item identifiers are 1-based"));
            }
            let weight: u64 = match weight_s {
                Some(s) => s
                    .parse()
                    .map_err(|_| parse_error(lineno, tok, "bad item weight"))?,
                None => 1,
            };
            if items.contains(&(item - 1)) {
                return Err(parse_error(lineno, tok, "duplicate item in transaction"));
            }
            max_item = max_item.max(item);
            items.push(item - 1);
            weights.push(weight);
        }
        raw.push((items, weights));
    }

    let mut db = TransactionDb::new(max_item);
    for (items, weights) in &raw {
        db.push(items, weights);
    }
    Ok(db)
}

fn parse_error(lineno: usize, tok: &str, msg: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("PARSE ERROR! line {}, token `{}`: {}", lineno, tok, msg),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_weighted() {
        let text = "c a comment\n1 2:3\n\n2 3:2\n";
        let db = parse_db(&mut Cursor::new(text)).unwrap();
        assert_eq!(db.nb_items(), 3);
        assert_eq!(db.nb_trans(), 2);
        assert_eq!(db.weights(0), &[1, 3]);
        assert_eq!(db.weights(1), &[1, 2]);
        assert_eq!(db.appearances(Var::from_idx(1)), &[0, 1]);
        assert_eq!(db.item_weight(Var::from_idx(1)), 4);
        assert_eq!(db.item_weight(Var::from_idx(2)), 2);
    }

    #[test]
    fn test_parse_rejects_zero_item() {
        let text = "1 0 2\n";
        assert!(parse_db(&mut Cursor::new(text)).is_err());
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let text = "1 2 2\n";
        assert!(parse_db(&mut Cursor::new(text)).is_err());
    }

    #[test]
    fn test_parse_empty() {
        let db = parse_db(&mut Cursor::new("")).unwrap();
        assert_eq!(db.nb_items(), 0);
        assert_eq!(db.nb_trans(), 0);
    }
}
