/// How Fx55/Fx65 pick the registers they move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStore {
    /// V0 up to but not including Vx
    Exclusive,
    /// V0 through Vx
    Inclusive,
}

/// What happens to sprite pixels that fall past the right or bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteEdge {
    /// reappear on the opposite edge
    Wrap,
    /// dropped
    Clip,
}

/// Behaviour switches for instructions that CHIP-8 interpreters disagree on.
///
/// The default reproduces the reference machine: exclusive register
/// load/store, wrapping sprites and an entropy-seeded random source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    pub load_store: LoadStore,
    pub sprite_edge: SpriteEdge,
    pub rng_seed: Option<u64>,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            load_store: LoadStore::Exclusive,
            sprite_edge: SpriteEdge::Wrap,
            rng_seed: None,
        }
    }
}

impl Quirks {
    pub fn with_load_store(mut self, load_store: LoadStore) -> Self {
        self.load_store = load_store;
        self
    }

    pub fn with_sprite_edge(mut self, sprite_edge: SpriteEdge) -> Self {
        self.sprite_edge = sprite_edge;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// number of registers Fx55/Fx65 move for register index `x`
    pub(crate) fn register_count(&self, x: usize) -> usize {
        match self.load_store {
            LoadStore::Exclusive => x,
            LoadStore::Inclusive => x + 1,
        }
    }
}
