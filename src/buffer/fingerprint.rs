use xxhash_rust::xxh3::Xxh3;

use crate::buffer::builder::BuildOutput;

const XXH3_SEED: u64 = 0x5f3c_a1d7_e29b_4c08;

/// Content fingerprint of a build. Equal fingerprints mean byte-identical buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct BufferFingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl std::fmt::Display for BufferFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

pub(crate) fn fingerprint_output(out: &BuildOutput) -> BufferFingerprint {
    let mut h = StableHasher::new();
    h.write_bytes(out.class.as_str().as_bytes());
    h.write_u64(out.stride() as u64);
    h.write_u64(out.vertices.len() as u64);
    h.write_bytes(out.vertex_bytes());
    h.write_u64(out.indices.len() as u64);
    h.write_bytes(out.index_bytes());
    for &n in &out.vertices_per_feature {
        h.write_u32(n);
    }
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn finish(self) -> BufferFingerprint {
        let v = self.inner.digest128();
        BufferFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}
