use core::fmt;

/// The dispatch-level error taxonomy.
///
/// Every failure a request can produce is one of these variants; anything below the dispatch
/// boundary (storage I/O, codec panics on corrupt data) is wrapped into [`DispatchError::Decode`]
/// or left to propagate as a panic, per the storage layer's own contract.
#[derive(Debug)]
pub enum DispatchError {
    /// The request payload could not be decoded against its opcode's expected ABI shape.
    Decode(anyhow::Error),
    /// The leading opcode word did not match any known operation.
    InvalidOpcode(i128),
    /// The request named a handle id with no entry in the root registry.
    StoreMissing(u64),
    /// An insert reached a leaf whose rect is too small to split further.
    DegenerateSplit,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Decode(e) => write!(f, "failed to decode request payload: {e}"),
            DispatchError::InvalidOpcode(op) => write!(f, "unknown opcode {op}"),
            DispatchError::StoreMissing(id) => write!(f, "no quadtree registered under id {id}"),
            DispatchError::DegenerateSplit => {
                write!(f, "quadtree rect is too small to split further")
            }
        }
    }
}

impl core::error::Error for DispatchError {}
