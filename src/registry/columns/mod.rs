//! Column definition modules, merged into the registry on first use.

mod fantasy;
mod games;
mod markets;
mod passing;
mod player;
mod receiving;
mod rushing;

use super::ColumnDefinition;

/// Every definition from every module, in module order.
pub fn all() -> Vec<ColumnDefinition> {
    [
        player::columns(),
        rushing::columns(),
        receiving::columns(),
        passing::columns(),
        games::columns(),
        fantasy::columns(),
        markets::columns(),
    ]
    .into_iter()
    .flatten()
    .collect()
}
