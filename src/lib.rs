// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NeuroMLlite
//!
//! Declarative, serializable descriptions of neural network structure.
//!
//! A network is a tree of schema-constrained objects (populations,
//! projections, inputs, ...) that round-trips losslessly through JSON and
//! YAML. Sizes, weights and probabilities may be expressions over the
//! network's parameters. A network can be expanded into concrete cells and
//! connections and streamed to pluggable handlers, e.g. a GraphViz diagram
//! or a SONATA-style node table.
//!
//! ## Crates
//!
//! - [`base`]: the schema-constrained object model, serialization,
//!   snapshots and the expression evaluator
//! - [`network`]: entity schemas, network generation and handlers
//! - [`config`]: `neuromllite.toml` loading with environment and CLI overrides
//! - [`observability`]: logging initialisation and verbosity
//!
//! ## Usage
//!
//! ```rust
//! use neuromllite::prelude::*;
//!
//! let mut net = Network::new("net0");
//! net.add_population(Population::new("pop0").with("size", 5).unwrap()).unwrap();
//! net.add_population(Population::new("pop1").with("size", 10).unwrap()).unwrap();
//! net.add_projection(
//!     Projection::new("proj0")
//!         .with("presynaptic", "pop0").unwrap()
//!         .with("postsynaptic", "pop1").unwrap()
//!         .with("random_connectivity", RandomConnectivity::with_probability(0.5).unwrap())
//!         .unwrap(),
//! )
//! .unwrap();
//!
//! let text = net.to_json(4).unwrap();
//! assert_eq!(Network::from_json(&text).unwrap(), net);
//!
//! let mut handler = DefaultNetworkHandler::new(Verbosity::Quiet);
//! let summary = generate_network(&net, &mut handler, &GeneratorOptions::default()).unwrap();
//! assert_eq!(summary.cells, 15);
//! ```

pub use neuromllite_base as base;
pub use neuromllite_config as config;
pub use neuromllite_network as network;
pub use neuromllite_observability as observability;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::base::{
        evaluate, EvaluableExpression, EvaluatedValue, FieldValue, ModelError, ModelResult,
        Parameters, SchemaObject, SchemaType, StructuredFormat,
    };
    pub use crate::config::{load_config, load_config_or_default, NeuroMLliteConfig};
    pub use crate::network::{
        generate_network, load_network, load_network_json, load_network_yaml,
        load_simulation_json, save_network, Cell, DefaultNetworkHandler, GenerationSummary, GeneratorOptions,
        GraphVizHandler, Input, InputSource, Location, Network, NetworkError, NetworkHandler,
        NetworkResult, OneToOneConnector, Population, Projection, RandomConnectivity,
        RandomLayout, RectangularRegion, RelativeLayout, Simulation, SingleLocation,
        SonataHandler, Synapse,
    };
    pub use crate::observability::Verbosity;
}
