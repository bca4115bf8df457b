//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::config::PropagationOrder;

/// Propagation order for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationOrderArg {
    /// Notify by distance from the changed property
    #[value(name = "breadth-first", alias = "bfs")]
    BreadthFirst,
    /// Notify each property after all of its affected dependencies
    #[value(name = "topological", alias = "topo")]
    Topological,
}

impl std::fmt::Display for PropagationOrderArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", PropagationOrder::from(*self))
    }
}

impl From<PropagationOrderArg> for PropagationOrder {
    fn from(arg: PropagationOrderArg) -> Self {
        match arg {
            PropagationOrderArg::BreadthFirst => Self::BreadthFirst,
            PropagationOrderArg::Topological => Self::Topological,
        }
    }
}
