// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# neuromllite-network

NeuroMLlite network descriptions and what can be done with them:

- [`schemas`]: the entity types (`Network`, `Population`, `Projection`,
  `Input`, `Simulation`, ...) built on the `neuromllite-base` object model
- [`generate_network`]: expand a network into cells, connections and inputs
- [`handlers`]: receivers of the generated events, including a logging
  handler, a GraphViz exporter and a SONATA-style node table exporter
- [`io`]: loading networks and simulations from JSON or YAML files

```rust
use neuromllite_network::{generate_network, DefaultNetworkHandler, GeneratorOptions, Network, Population};
use neuromllite_observability::Verbosity;

let mut net = Network::new("net0");
net.add_population(Population::new("pop0").with("size", 3).unwrap()).unwrap();

let mut handler = DefaultNetworkHandler::new(Verbosity::Quiet);
let summary = generate_network(&net, &mut handler, &GeneratorOptions::default()).unwrap();
assert_eq!(summary.cells, 3);
```
*/

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod generator;
pub mod handlers;
pub mod io;
pub mod schemas;
pub mod types;

pub use generator::{generate_network, GenerationSummary, GeneratorOptions, DEFAULT_SEED};
pub use handlers::{
    Connection, DefaultNetworkHandler, GraphVizHandler, NetworkHandler, ProjectionEvent,
    ProjectionType, SonataHandler,
};
pub use io::{load_network, load_network_json, load_network_yaml, load_simulation_json, save_network};
pub use schemas::*;
pub use types::{NetworkError, NetworkResult};
