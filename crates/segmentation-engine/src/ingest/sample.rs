use crate::error::{Result, SegmentationError};
use crate::properties::{Attributes, Value};
use crate::topology::{Level, NodeAttrs, TopologyModel};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Capability that produces a sample topology for the exercise.
pub trait SampleSource {
    fn name(&self) -> &str;
    fn generate(&self) -> Result<TopologyModel>;
}

/// (id, level, role)
const PLANT_NODES: &[(&str, Level, &str)] = &[
    ("corp-ws", 4, "Corporate workstation"),
    ("erp", 4, "ERP server"),
    ("dmz-fw", 3, "Industrial DMZ firewall"),
    ("historian", 3, "Plant historian"),
    ("jump-host", 3, "Remote access jump host"),
    ("scada", 2, "SCADA server"),
    ("hmi", 2, "Operator HMI"),
    ("eng-ws", 2, "Engineering workstation"),
    ("plc-1", 1, "Line 1 PLC"),
    ("plc-2", 1, "Line 2 PLC"),
    ("rtu", 1, "Substation RTU"),
];

/// (source, target, protocol)
const PLANT_LINKS: &[(&str, &str, &str)] = &[
    ("corp-ws", "erp", "https"),
    ("erp", "dmz-fw", "https"),
    ("dmz-fw", "historian", "opc-ua"),
    ("dmz-fw", "jump-host", "rdp"),
    ("historian", "scada", "opc-ua"),
    ("jump-host", "scada", "rdp"),
    ("scada", "hmi", "opc-ua"),
    ("hmi", "plc-1", "modbus"),
    ("eng-ws", "plc-2", "s7comm"),
    ("scada", "rtu", "dnp3"),
    // Planted segmentation mistakes for the trainee to find.
    ("corp-ws", "hmi", "vnc"),
    ("erp", "plc-1", "modbus"),
    ("rtu", "historian", "dnp3"),
];

/// Four-tier reference plant: corporate, DMZ, control and field zones.
///
/// The base content is fixed. `extra_links` adds that many pseudo-random
/// links drawn from a PCG generator seeded with `seed`, so the same seed
/// always yields the same topology.
#[derive(Debug, Clone, Default)]
pub struct ReferencePlant {
    pub extra_links: usize,
    pub seed: u64,
}

impl ReferencePlant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_links(mut self, extra_links: usize, seed: u64) -> Self {
        self.extra_links = extra_links;
        self.seed = seed;
        self
    }
}

impl SampleSource for ReferencePlant {
    fn name(&self) -> &str {
        "reference_plant"
    }

    fn generate(&self) -> Result<TopologyModel> {
        let mut model = TopologyModel::new();
        for (id, level, role) in PLANT_NODES {
            model.add_node(id, NodeAttrs::new(*level, *role));
        }
        for (source, target, protocol) in PLANT_LINKS {
            model.add_edge(source, target, protocol_attrs(protocol));
        }

        let mut rng = Pcg64::seed_from_u64(self.seed);
        for _ in 0..self.extra_links {
            let source = PLANT_NODES[rng.random_range(0..PLANT_NODES.len())].0;
            let target = PLANT_NODES[rng.random_range(0..PLANT_NODES.len())].0;
            if source == target {
                continue;
            }
            let mut attrs = protocol_attrs("tcp");
            attrs.insert("generated".to_string(), Value::Bool(true));
            model.add_edge(source, target, attrs);
        }

        Ok(model)
    }
}

fn protocol_attrs(protocol: &str) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("protocol".to_string(), Value::String(protocol.to_string()));
    attrs
}

/// Stand-in used when no sample helper is installed.
#[derive(Debug, Clone)]
pub struct UnavailableSample {
    pub reason: String,
}

impl UnavailableSample {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SampleSource for UnavailableSample {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn generate(&self) -> Result<TopologyModel> {
        Err(SegmentationError::SampleUnavailable(self.reason.clone()))
    }
}
