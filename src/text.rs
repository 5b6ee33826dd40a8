//! Text-processing front ends that build dictionaries out of input streams.

use std::io::{self, BufRead};

use log::{debug, info};

use crate::Dictionary;

/// Characters that separate words for [`word_frequencies`].
pub const WORD_DELIMITERS: &str = " \t\\\"',<.>/?;:[{]}|`~!@#$%^&*()-_=+0123456789";

/// Maps every whitespace-separated token to the position of its last
/// occurrence, counting tokens from 1.
pub fn order_dictionary<R: BufRead>(reader: R) -> io::Result<Dictionary<String, u64>> {
    let mut dict = Dictionary::new();
    let mut counter = 0;
    for line in reader.lines() {
        for token in line?.split_whitespace() {
            counter += 1;
            dict.set_value(token.to_string(), counter);
        }
    }
    info!("read {counter} tokens, {} distinct", dict.len());
    Ok(dict)
}

/// The pairs in key order, a blank line, then the keys in pre-order.
pub fn render_order<K, V>(dict: &Dictionary<K, V>) -> String
where
    K: std::fmt::Display,
    V: std::fmt::Display,
{
    format!("{dict}\n{}\n", dict.pre_string())
}

/// Lower-cased words of `line`, split on [`WORD_DELIMITERS`].
pub fn words(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split(|c: char| WORD_DELIMITERS.contains(c))
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Counts how often each word occurs.
pub fn word_frequencies<R: BufRead>(reader: R) -> io::Result<Dictionary<String, u64>> {
    let mut dict = Dictionary::new();
    for line in reader.lines() {
        for word in words(&line?) {
            match dict.get_value_mut(word.as_str()) {
                Ok(count) => *count += 1,
                Err(_) => {
                    dict.set_value(word, 1);
                }
            }
        }
    }
    debug!("counted {} distinct words", dict.len());
    Ok(dict)
}
