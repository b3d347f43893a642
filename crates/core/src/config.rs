use quadrosol_merkle::TreeConfig;

/// Tunable parameters for a precompile instance.
///
/// A single `Config` is shared by every tree the instance manages; trees created with different
/// configs never need to be compared against one another, so there is no per-handle override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on how many points a k-nearest-neighbor query may request at once, guarding
    /// against a caller asking for an unbounded scan dressed up as a k-NN query.
    pub max_k_nearest: u32,
    /// Upper bound on how many points a leaf may hold before an insert forces a split. See
    /// [`quadrosol_merkle::LEAF_CAPACITY`] for the hard ceiling the node codec imposes on this.
    pub leaf_capacity: usize,
    /// A rect whose width and height are both within this bound (absolute value) aborts a split
    /// with `DegenerateSplit` rather than recursing forever. See [`TreeConfig::degenerate_split_threshold`].
    pub degenerate_split_threshold: i32,
}

impl Default for Config {
    fn default() -> Self {
        let tree_defaults = TreeConfig::default();

        Self {
            max_k_nearest: 256,
            leaf_capacity: tree_defaults.leaf_capacity,
            degenerate_split_threshold: tree_defaults.degenerate_split_threshold,
        }
    }
}

impl Config {
    /// Derives the [`TreeConfig`] this instance's dispatcher should build every tree with.
    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            leaf_capacity: self.leaf_capacity,
            degenerate_split_threshold: self.degenerate_split_threshold,
        }
    }
}
