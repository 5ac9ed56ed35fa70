//! Widgets and the Slint glue that hosts them.

pub(crate) mod city_grid;
pub(crate) mod grid_measure;
pub(crate) mod index_strip;
pub(crate) mod strip_bridge;
