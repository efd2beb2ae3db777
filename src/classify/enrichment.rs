use crate::models::{ItemMetadata, META_FUN_FACT, META_IMPACT, META_TRANSFORMATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enrichment {
    pub key: &'static str,
    pub transformation: &'static str,
    pub impact: &'static str,
    pub fun_fact: &'static str,
}

impl Enrichment {
    pub fn to_metadata(&self) -> ItemMetadata {
        let mut meta = ItemMetadata::new();
        meta.insert(META_TRANSFORMATION.to_string(), self.transformation.to_string());
        meta.insert(META_IMPACT.to_string(), self.impact.to_string());
        meta.insert(META_FUN_FACT.to_string(), self.fun_fact.to_string());
        meta
    }

    /// Fills keys missing from `meta`; supplied keys are kept.
    pub fn backfill(&self, meta: &mut ItemMetadata) {
        for (key, value) in [
            (META_TRANSFORMATION, self.transformation),
            (META_IMPACT, self.impact),
            (META_FUN_FACT, self.fun_fact),
        ] {
            let missing = meta.get(key).map_or(true, |v| v.trim().is_empty());
            if missing {
                meta.insert(key.to_string(), value.to_string());
            }
        }
    }
}

// Checked in order; more specific keys come first.
pub const ENRICHMENT_TABLE: &[Enrichment] = &[
    Enrichment {
        key: "plastic bag",
        transformation: "Compressed and heated to form durable plastic lumber for decks and park benches.",
        impact: "Keeping bags out of the environment spares marine animals that mistake them for food.",
        fun_fact: "The average plastic bag is used for 12 minutes but can persist for up to 1,000 years.",
    },
    Enrichment {
        key: "bottle",
        transformation: "Shredded into flakes and spun into polyester fibre for jerseys and fleece jackets.",
        impact: "Recycling one ton of PET bottles saves 3.8 barrels of oil.",
        fun_fact: "Plastic bottles can take up to 450 years to decompose in a landfill.",
    },
    Enrichment {
        key: "cup",
        transformation: "Crushed into aggregate for eco-friendly floor tiles and backsplashes.",
        impact: "Recycling ceramic avoids mining new clay and cuts kiln energy use by about 15%.",
        fun_fact: "Ceramic is not accepted in regular glass recycling bins.",
    },
    Enrichment {
        key: "book",
        transformation: "De-inked and pulped into recycled office paper or shipping cardboard.",
        impact: "Recycling one ton of paper saves 17 trees and 7,000 gallons of water.",
        fun_fact: "Books in good condition do more good donated than recycled.",
    },
    Enrichment {
        key: "paper",
        transformation: "Pulped and pressed into egg cartons, cereal boxes or packing material.",
        impact: "Recycled paper takes 40% less energy to make than virgin pulp.",
        fun_fact: "Paper fibres survive 5 to 7 recycling rounds before they get too short.",
    },
    Enrichment {
        key: "can",
        transformation: "Melted into ingots and rolled into sheet for the next generation of cans.",
        impact: "Recycling aluminium saves 95% of the energy needed to make it from bauxite.",
        fun_fact: "A recycled can can be back on the shelf in as little as 60 days.",
    },
    Enrichment {
        key: "metal",
        transformation: "Purified and rolled into sheet for car parts or structural beams.",
        impact: "Reduces destructive mining and saves up to 95% of production energy.",
        fun_fact: "Recycling one aluminium can saves enough energy to run a TV for three hours.",
    },
    Enrichment {
        key: "tin",
        transformation: "Magnetically sorted and melted into high-strength steel for infrastructure.",
        impact: "Recycled steel cuts air pollution by 86% compared with virgin ore.",
        fun_fact: "Steel is the most recycled material in the world.",
    },
    Enrichment {
        key: "glass",
        transformation: "Crushed into cullet and reborn as fibreglass insulation or new jars.",
        impact: "Recycled cullet lowers furnace temperatures and saves energy.",
        fun_fact: "Glass can be recycled forever without losing quality.",
    },
    Enrichment {
        key: "jar",
        transformation: "Melted into new food-grade containers or reflective road-marking beads.",
        impact: "Recycling 1,000 tons of glass creates 8 more jobs than landfilling it.",
        fun_fact: "Thick glass jars are recycled more efficiently than thin bottles.",
    },
    Enrichment {
        key: "banana",
        transformation: "Sent to anaerobic digesters to make biogas for local electricity and liquid fertiliser.",
        impact: "Diverting organics from landfill prevents methane, a gas 25x more potent than CO2.",
        fun_fact: "Banana peels are rich in potassium and phosphorus, ideal for plant growth.",
    },
    Enrichment {
        key: "apple",
        transformation: "Returned to the soil as humus that feeds next season's orchards.",
        impact: "Each kilogram of composted food waste avoids about 1.5 kg of CO2 emissions.",
        fun_fact: "An apple core can compost in as little as two weeks.",
    },
    Enrichment {
        key: "laptop",
        transformation: "Rare-earth elements are recovered from circuit boards for new batteries and screens.",
        impact: "Keeps lithium-ion batteries from starting fires in waste trucks.",
        fun_fact: "Up to 98% of a laptop is recyclable.",
    },
    Enrichment {
        key: "phone",
        transformation: "Dismantled to reclaim gold, silver and palladium for future electronics.",
        impact: "Proper e-waste handling keeps lead, mercury and cadmium out of groundwater.",
        fun_fact: "A ton of old phones holds more gold than a ton of gold ore.",
    },
];

pub const DEFAULT_ENRICHMENT: Enrichment = Enrichment {
    key: "default",
    transformation: "Sorted at a recovery facility and turned into raw material for new products where possible.",
    impact: "Every correctly sorted item keeps recycling streams clean and reduces landfill load.",
    fun_fact: "Sorting waste at the source is the single most effective step toward a circular economy.",
};

/// First table key contained in `label` (case-insensitive), else the default entry.
pub fn enrichment_for(label: &str) -> &'static Enrichment {
    let label = label.to_lowercase();
    ENRICHMENT_TABLE
        .iter()
        .find(|entry| label.contains(entry.key))
        .unwrap_or(&DEFAULT_ENRICHMENT)
}
