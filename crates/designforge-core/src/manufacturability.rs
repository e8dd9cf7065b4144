//! Production feasibility lookup keyed on material and product category.

use serde::{Deserialize, Serialize};

use crate::domain::{MaterialType, ProductCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturabilityReport {
    pub feasible: bool,
    /// 0 to 10, higher is harder to produce.
    pub complexity_score: f64,
    pub estimated_cost_tier: CostTier,
    pub manufacturing_methods: Vec<String>,
    pub recommendations: Vec<String>,
}

pub fn analyze(material: MaterialType, category: ProductCategory) -> ManufacturabilityReport {
    let (methods, complexity_score, estimated_cost_tier): (&[&str], f64, CostTier) = match material {
        MaterialType::Metal | MaterialType::Plastic => {
            (&["injection_molding", "cnc_machining"], 6.5, CostTier::Medium)
        }
        MaterialType::CarbonFiber => (&["composite_layup"], 8.5, CostTier::High),
        _ => (&[], 0.0, CostTier::Medium),
    };

    let recommendations: &[&str] = match category {
        ProductCategory::Car => &[
            "Consider modular design approach for cost optimization",
            "Validate aerodynamic properties in CFD simulation",
        ],
        ProductCategory::Electronics => &[
            "Ensure adequate ventilation for thermal management",
            "Design for ease of assembly with minimal fasteners",
        ],
        _ => &[],
    };

    ManufacturabilityReport {
        feasible: true,
        complexity_score,
        estimated_cost_tier,
        manufacturing_methods: methods.iter().map(|m| m.to_string()).collect(),
        recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
    }
}
