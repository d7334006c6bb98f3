// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
NeuroMLlite entity schemas.

Declaration order below is the serialized key order. Identified entities
start with `notes`; `id` is implicit.

Cross-references between entities (a population's `component`, a
projection's `presynaptic`/`postsynaptic`/`synapse`, an input's
`input_source`/`population`) are plain id strings, resolved by the network
generator when it walks the network.
*/

use neuromllite_base::{
    schema_type, ChildDef, EvaluableExpression, FieldDef, FieldKind, ModelResult, Parameters,
    Schema, SchemaObject,
};

const NOTES: FieldDef = FieldDef::new("notes", "Human readable notes", FieldKind::Str);

const PARAMETERS: FieldDef = FieldDef::new(
    "parameters",
    "Dictionary of parameters for the component",
    FieldKind::Dict,
);

const NEUROML2_SOURCE_FILE: FieldDef = FieldDef::new(
    "neuroml2_source_file",
    "File name of NeuroML2 file",
    FieldKind::Str,
);

const LEMS_SOURCE_FILE: FieldDef = FieldDef::new(
    "lems_source_file",
    "File name of LEMS file",
    FieldKind::Str,
);

pub static CELL_SCHEMA: Schema = Schema {
    type_name: "Cell",
    definition: "A type of cell, defined by a file or an external simulator component",
    identified: true,
    fields: &[
        NOTES,
        PARAMETERS,
        NEUROML2_SOURCE_FILE,
        LEMS_SOURCE_FILE,
        FieldDef::new("neuroml2_cell", "Name of standard NeuroML2 cell type", FieldKind::Str),
        FieldDef::new("pynn_cell", "Name of standard PyNN cell type", FieldKind::Str),
        FieldDef::new("arbor_cell", "Name of standard Arbor cell type", FieldKind::Str),
        FieldDef::new("bindsnet_node", "Name of standard BindsNET node", FieldKind::Str),
    ],
    children: &[],
};

pub static SYNAPSE_SCHEMA: Schema = Schema {
    type_name: "Synapse",
    definition: "A synapse model, defined by a file or an external simulator component",
    identified: true,
    fields: &[
        NOTES,
        PARAMETERS,
        NEUROML2_SOURCE_FILE,
        LEMS_SOURCE_FILE,
        FieldDef::new("pynn_synapse_type", "Option for PyNN synapse type (curr_exp, cond_alpha, ...)", FieldKind::Str),
        FieldDef::new("pynn_receptor_type", "Option for PyNN receptor type (excitatory, inhibitory)", FieldKind::Str),
    ],
    children: &[],
};

pub static INPUT_SOURCE_SCHEMA: Schema = Schema {
    type_name: "InputSource",
    definition: "A model of an input to a population",
    identified: true,
    fields: &[
        NOTES,
        PARAMETERS,
        NEUROML2_SOURCE_FILE,
        FieldDef::new("neuroml2_input", "Name of standard NeuroML2 input", FieldKind::Str),
        LEMS_SOURCE_FILE,
        FieldDef::new("pynn_input", "Name of PyNN input", FieldKind::Str),
    ],
    children: &[],
};

pub static RECTANGULAR_REGION_SCHEMA: Schema = Schema {
    type_name: "RectangularRegion",
    definition: "A cuboid region of 3D space",
    identified: true,
    fields: &[
        NOTES,
        FieldDef::new("x", "x coordinate of corner", FieldKind::Float),
        FieldDef::new("y", "y coordinate of corner", FieldKind::Float),
        FieldDef::new("z", "z coordinate of corner", FieldKind::Float),
        FieldDef::new("width", "Width of rectangular region", FieldKind::Float),
        FieldDef::new("height", "Height of rectangular region", FieldKind::Float),
        FieldDef::new("depth", "Depth of rectangular region", FieldKind::Float),
    ],
    children: &[],
};

pub static LOCATION_SCHEMA: Schema = Schema {
    type_name: "Location",
    definition: "A point in 3D space",
    identified: false,
    fields: &[
        FieldDef::new("x", "x coordinate", FieldKind::Float),
        FieldDef::new("y", "y coordinate", FieldKind::Float),
        FieldDef::new("z", "z coordinate", FieldKind::Float),
    ],
    children: &[],
};

pub static RANDOM_LAYOUT_SCHEMA: Schema = Schema {
    type_name: "RandomLayout",
    definition: "Random placement of cells inside a region",
    identified: false,
    fields: &[
        FieldDef::new(
            "size",
            "Number of cells to place, when the population sets no size",
            FieldKind::Expression,
        ),
        FieldDef::new("region", "Region in which to place cells", FieldKind::Str),
    ],
    children: &[],
};

pub static RELATIVE_LAYOUT_SCHEMA: Schema = Schema {
    type_name: "RelativeLayout",
    definition: "Placement of cells at an offset from the corner of a region",
    identified: false,
    fields: &[
        FieldDef::new("region", "Region relative to which the population is placed", FieldKind::Str),
        FieldDef::new("x", "x offset from the region corner", FieldKind::Float),
        FieldDef::new("y", "y offset from the region corner", FieldKind::Float),
        FieldDef::new("z", "z offset from the region corner", FieldKind::Float),
    ],
    children: &[],
};

pub static SINGLE_LOCATION_SCHEMA: Schema = Schema {
    type_name: "SingleLocation",
    definition: "Placement of every cell at one explicit location",
    identified: false,
    fields: &[FieldDef::new(
        "location",
        "The location",
        FieldKind::Object(&LOCATION_SCHEMA),
    )],
    children: &[],
};

pub static POPULATION_SCHEMA: Schema = Schema {
    type_name: "Population",
    definition: "A population of cells of one component type",
    identified: true,
    fields: &[
        NOTES,
        FieldDef::new("size", "Size of the population", FieldKind::Expression),
        FieldDef::new("component", "Type of cell to use in population", FieldKind::Str),
        FieldDef::new("properties", "Dictionary of properties (metadata) for the population", FieldKind::Dict),
        FieldDef::new(
            "random_layout",
            "Layout in the population",
            FieldKind::Object(&RANDOM_LAYOUT_SCHEMA),
        ),
        FieldDef::new(
            "relative_layout",
            "Position relative to a region",
            FieldKind::Object(&RELATIVE_LAYOUT_SCHEMA),
        ),
        FieldDef::new(
            "single_location",
            "Explicit location of the cells",
            FieldKind::Object(&SINGLE_LOCATION_SCHEMA),
        ),
    ],
    children: &[],
};

pub static RANDOM_CONNECTIVITY_SCHEMA: Schema = Schema {
    type_name: "RandomConnectivity",
    definition: "Connect each pre/post cell pair with a fixed probability",
    identified: false,
    fields: &[FieldDef::new(
        "probability",
        "Random probability of connection",
        FieldKind::Expression,
    )],
    children: &[],
};

pub static ONE_TO_ONE_CONNECTOR_SCHEMA: Schema = Schema {
    type_name: "OneToOneConnector",
    definition: "Connect cell i of the presynaptic population to cell i of the postsynaptic one",
    identified: false,
    fields: &[],
    children: &[],
};

pub static PROJECTION_SCHEMA: Schema = Schema {
    type_name: "Projection",
    definition: "A projection between two populations",
    identified: true,
    fields: &[
        NOTES,
        FieldDef::new("presynaptic", "Presynaptic population", FieldKind::Str),
        FieldDef::new("postsynaptic", "Postsynaptic population", FieldKind::Str),
        FieldDef::new("synapse", "Synapse to use", FieldKind::Str),
        FieldDef::new("pre_synapse", "For continuous connections, what presynaptic component should be used", FieldKind::Str),
        FieldDef::new("type", "Type of projection: projection (default), electricalProjection, continuousProjection", FieldKind::Str),
        FieldDef::new("delay", "Delay to use (default: 0)", FieldKind::Expression),
        FieldDef::new("weight", "Weight to use (default: 1)", FieldKind::Expression),
        FieldDef::new(
            "random_connectivity",
            "Use random connectivity",
            FieldKind::Object(&RANDOM_CONNECTIVITY_SCHEMA),
        ),
        FieldDef::new(
            "one_to_one_connector",
            "Connect cell index i in pre population to cell index i in post population for all i",
            FieldKind::Object(&ONE_TO_ONE_CONNECTOR_SCHEMA),
        ),
    ],
    children: &[],
};

pub static INPUT_SCHEMA: Schema = Schema {
    type_name: "Input",
    definition: "Stimulation of a population by an input source",
    identified: true,
    fields: &[
        NOTES,
        FieldDef::new("input_source", "Type of input to use in population", FieldKind::Str),
        FieldDef::new("population", "Population to target", FieldKind::Str),
        FieldDef::new("percentage", "Percentage of cells to apply this input to", FieldKind::Float),
        FieldDef::new("number_per_cell", "Number of individual inputs per selected cell (default: 1)", FieldKind::Expression),
        FieldDef::new("weight", "Weight to use (default: 1)", FieldKind::Expression),
    ],
    children: &[],
};

pub static NETWORK_SCHEMA: Schema = Schema {
    type_name: "Network",
    definition: "A network of populations, projections and inputs",
    identified: true,
    fields: &[
        NOTES,
        FieldDef::new("version", "Information on version of NeuroMLlite", FieldKind::Str),
        FieldDef::new("seed", "Seed for random number generator used when building network", FieldKind::Int),
        FieldDef::new("temperature", "Temperature at which to run network (float in deg C)", FieldKind::Float),
        FieldDef::new("parameters", "Dictionary of global parameters for the network", FieldKind::Dict),
    ],
    children: &[
        ChildDef::new("cells", "The cell definitions which the populations are built from", &CELL_SCHEMA),
        ChildDef::new("synapses", "The synapse definitions used in the projections", &SYNAPSE_SCHEMA),
        ChildDef::new("input_sources", "The definitions of sources of external input", &INPUT_SOURCE_SCHEMA),
        ChildDef::new("regions", "The regions in which populations are placed", &RECTANGULAR_REGION_SCHEMA),
        ChildDef::new("populations", "The populations of cells in the network", &POPULATION_SCHEMA),
        ChildDef::new("projections", "The projections between populations", &PROJECTION_SCHEMA),
        ChildDef::new("inputs", "The inputs to apply to the populations", &INPUT_SCHEMA),
    ],
};

pub static SIMULATION_SCHEMA: Schema = Schema {
    type_name: "Simulation",
    definition: "A simulation run of a network",
    identified: true,
    fields: &[
        NOTES,
        FieldDef::new("version", "Information on version of NeuroMLlite", FieldKind::Str),
        FieldDef::new("network", "File name of network to simulate", FieldKind::Str),
        FieldDef::new("duration", "Duration of simulation (ms)", FieldKind::Float),
        FieldDef::new("dt", "Timestep of simulation (ms)", FieldKind::Float),
        FieldDef::new("seed", "Seed for stochastic elements of the simulation (integer)", FieldKind::Int),
        FieldDef::new("recordTraces", "Record traces?", FieldKind::Dict),
        FieldDef::new("recordSpikes", "Record spikes?", FieldKind::Dict),
        FieldDef::new("recordRates", "Record rates?", FieldKind::Dict),
        FieldDef::new("recordVariables", "Record named variables?", FieldKind::Dict),
    ],
    children: &[],
};

schema_type! {
    /// Top-level container of a network description
    pub struct Network: NETWORK_SCHEMA, id;
}

schema_type! {
    pub struct Cell: CELL_SCHEMA, id;
}

schema_type! {
    pub struct Synapse: SYNAPSE_SCHEMA, id;
}

schema_type! {
    pub struct InputSource: INPUT_SOURCE_SCHEMA, id;
}

schema_type! {
    pub struct RectangularRegion: RECTANGULAR_REGION_SCHEMA, id;
}

schema_type! {
    pub struct Population: POPULATION_SCHEMA, id;
}

schema_type! {
    pub struct RandomLayout: RANDOM_LAYOUT_SCHEMA;
}

schema_type! {
    pub struct RelativeLayout: RELATIVE_LAYOUT_SCHEMA;
}

schema_type! {
    pub struct SingleLocation: SINGLE_LOCATION_SCHEMA;
}

schema_type! {
    pub struct Location: LOCATION_SCHEMA;
}

schema_type! {
    pub struct Projection: PROJECTION_SCHEMA, id;
}

schema_type! {
    pub struct RandomConnectivity: RANDOM_CONNECTIVITY_SCHEMA;
}

schema_type! {
    pub struct OneToOneConnector: ONE_TO_ONE_CONNECTOR_SCHEMA;
}

schema_type! {
    pub struct Input: INPUT_SCHEMA, id;
}

schema_type! {
    /// Simulation settings referring to a network file
    pub struct Simulation: SIMULATION_SCHEMA, id;
}

impl Network {
    /// Global parameters, empty when unset
    pub fn parameters(&self) -> Parameters {
        self.get_dict("parameters").cloned().unwrap_or_default()
    }

    pub fn cells(&self) -> &[SchemaObject] {
        self.collection("cells")
    }

    pub fn synapses(&self) -> &[SchemaObject] {
        self.collection("synapses")
    }

    pub fn input_sources(&self) -> &[SchemaObject] {
        self.collection("input_sources")
    }

    pub fn regions(&self) -> &[SchemaObject] {
        self.collection("regions")
    }

    pub fn populations(&self) -> &[SchemaObject] {
        self.collection("populations")
    }

    pub fn projections(&self) -> &[SchemaObject] {
        self.collection("projections")
    }

    pub fn inputs(&self) -> &[SchemaObject] {
        self.collection("inputs")
    }

    pub fn add_cell(&mut self, cell: Cell) -> ModelResult<()> {
        self.add_child("cells", cell)
    }

    pub fn add_synapse(&mut self, synapse: Synapse) -> ModelResult<()> {
        self.add_child("synapses", synapse)
    }

    pub fn add_input_source(&mut self, source: InputSource) -> ModelResult<()> {
        self.add_child("input_sources", source)
    }

    pub fn add_region(&mut self, region: RectangularRegion) -> ModelResult<()> {
        self.add_child("regions", region)
    }

    pub fn add_population(&mut self, population: Population) -> ModelResult<()> {
        self.add_child("populations", population)
    }

    pub fn add_projection(&mut self, projection: Projection) -> ModelResult<()> {
        self.add_child("projections", projection)
    }

    pub fn add_input(&mut self, input: Input) -> ModelResult<()> {
        self.add_child("inputs", input)
    }
}

impl RandomConnectivity {
    pub fn with_probability(probability: impl Into<EvaluableExpression>) -> ModelResult<Self> {
        let probability: EvaluableExpression = probability.into();
        Self::new().with("probability", probability)
    }
}

impl RandomLayout {
    pub fn in_region(region: &str) -> ModelResult<Self> {
        Self::new().with("region", region)
    }
}

impl Location {
    pub fn at(x: f64, y: f64, z: f64) -> ModelResult<Self> {
        Self::new().with("x", x)?.with("y", y)?.with("z", z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromllite_base::{ModelError, SchemaType};
    use serde_json::json;

    #[test]
    fn test_identified_schemas_start_with_notes() {
        for schema in [
            &NETWORK_SCHEMA,
            &CELL_SCHEMA,
            &SYNAPSE_SCHEMA,
            &INPUT_SOURCE_SCHEMA,
            &RECTANGULAR_REGION_SCHEMA,
            &POPULATION_SCHEMA,
            &PROJECTION_SCHEMA,
            &INPUT_SCHEMA,
            &SIMULATION_SCHEMA,
        ] {
            assert!(schema.identified, "{}", schema.type_name);
            assert_eq!(schema.fields[0].name, "notes", "{}", schema.type_name);
        }
    }

    #[test]
    fn test_every_schema_rejects_undeclared_names() {
        let objects: Vec<SchemaObject> = vec![
            Network::new("n").into(),
            Cell::new("c").into(),
            Population::new("p").into(),
            Projection::new("pr").into(),
            RandomConnectivity::new().into(),
            OneToOneConnector::new().into(),
            SingleLocation::new().into(),
            Simulation::new("s").into(),
        ];
        for mut obj in objects {
            let err = obj.set_field("notcells", 1).unwrap_err();
            assert!(matches!(err, ModelError::SchemaViolation { .. }), "{}", obj.type_name());
        }
    }

    #[test]
    fn test_simulation_coerces_numeric_strings() {
        let sim = Simulation::new("Sim0")
            .with("network", "net0.json")
            .unwrap()
            .with("duration", "1000")
            .unwrap()
            .with("dt", "0.01")
            .unwrap()
            .with("recordTraces", json!({"all": "*"}))
            .unwrap();
        assert_eq!(sim.get_f64("duration"), Some(1000.0));
        assert_eq!(sim.get_f64("dt"), Some(0.01));
        assert!(sim.clone().with("dt", "fast").is_err());
    }

    #[test]
    fn test_network_helpers() {
        let mut net = Network::new("net0").with("parameters", json!({"N": 4})).unwrap();
        net.add_population(Population::new("pop0").with("size", "N").unwrap())
            .unwrap();
        net.add_projection(
            Projection::new("proj0")
                .with("random_connectivity", RandomConnectivity::with_probability(0.5).unwrap())
                .unwrap(),
        )
        .unwrap();
        assert_eq!(net.populations().len(), 1);
        assert_eq!(net.parameters().get("N"), Some(&json!(4)));
        assert!(net.add_population(Population::new("pop0")).is_err());

        let rc = net.projections()[0].get_object("random_connectivity").unwrap();
        assert_eq!(rc.get_expression("probability"), Some(&EvaluableExpression::Float(0.5)));
    }

    #[test]
    fn test_single_location_round_trip() {
        let layout = SingleLocation::new()
            .with("location", Location::at(1.0, 2.0, 3.0).unwrap())
            .unwrap();
        let pop = Population::new("p").with("single_location", layout).unwrap();
        let back = Population::from_json(&pop.to_json(2).unwrap()).unwrap();
        assert_eq!(back, pop);
        assert_eq!(
            back.get_object("single_location")
                .and_then(|l| l.get_object("location"))
                .and_then(|l| l.get_f64("z")),
            Some(3.0)
        );
        assert!(back.get_field("size").unwrap().is_none());
    }
}
