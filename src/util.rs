use std::{fs, path::Path};
use anyhow::Context;
use rand::{distributions::Alphanumeric, Rng};


pub fn read_to_string<P: AsRef<Path>>(p: P) -> anyhow::Result<String> {
Ok(fs::read_to_string(&p).with_context(|| format!("read file {:?}", p.as_ref()))?)
}


/// Lower-case alphanumeric suffix used to keep synthetic identities unique across runs.
pub fn random_suffix<R: Rng>(rng: &mut R, len: usize) -> String {
(0..len).map(|_| (rng.sample(Alphanumeric) as char).to_ascii_lowercase()).collect()
}


/// Keeps at most `max` characters, never splitting a code point.
pub fn truncate(s: &str, max: usize) -> String {
s.chars().take(max).collect()
}
