use crate::error::{Error, Result};

/// Deterministic text → fixed-width vector function.
///
/// The width returned by `dim` never changes for a given provider instance.
pub trait EmbeddingProvider {
    fn dim(&self) -> usize;

    fn embed(&self, text: &str) -> Vec<f64>;
}

/// Signed feature-hashing embedder over word unigrams and bigrams,
/// L2-normalized.
///
/// Stands in for a pretrained sentence encoder so the pipeline runs end to
/// end without model weights. Any `EmbeddingProvider` can replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    /// Fails with `Error::Configuration` on a zero width.
    pub fn new(dim: usize) -> Result<HashingEmbedder> {
        if dim == 0 {
            return Err(Error::Configuration("embedding width must be positive".into()));
        }
        Ok(HashingEmbedder { dim })
    }

    fn add_feature(&self, out: &mut [f64], feature: &str) {
        let h = fnv1a(feature.as_bytes());
        let idx = (h % self.dim as u64) as usize;
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        out[idx] += sign;
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Vec<f64> {
        let mut out = vec![0.0; self.dim];
        let words: Vec<&str> = text.split_whitespace().collect();
        for w in &words {
            self.add_feature(&mut out, w);
        }
        for pair in words.windows(2) {
            self.add_feature(&mut out, &format!("{} {}", pair[0], pair[1]));
        }
        let norm = out.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            out.iter_mut().for_each(|x| *x /= norm);
        }
        out
    }
}

/// 64-bit FNV-1a; stable across platforms and releases.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |h, &b| (h ^ b as u64).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_unit_norm_and_deterministic() {
        let e = HashingEmbedder::new(384).expect("embedder");
        let a = e.embed("flight delayed again");
        assert_eq!(a.len(), 384);
        assert_eq!(a, e.embed("flight delayed again"));
        let norm: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_text_embeds_to_zeros() {
        let e = HashingEmbedder::new(16).expect("embedder");
        assert!(e.embed("").iter().all(|&x| x == 0.0));
    }

    #[test]
    fn word_order_matters_through_bigrams() {
        let e = HashingEmbedder::new(1024).expect("embedder");
        assert_ne!(e.embed("not good"), e.embed("good not"));
    }

    #[test]
    fn fnv_reference_values() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn zero_width_is_a_configuration_error() {
        assert!(matches!(HashingEmbedder::new(0), Err(Error::Configuration(_))));
    }
}
