//! Shared fixtures for integration tests.

#![allow(dead_code)]

use paddy::data::DatasetLoadError;
use paddy::{ForestConfig, ServiceConfig, Table};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

pub const REGIONS: [&str; 3] = ["Punjab", "Kerala", "Odisha"];
pub const SOILS: [&str; 2] = ["Loam", "Clay"];
pub const SEASONS: [&str; 3] = ["Kharif", "Rabi", "Zaid"];

/// Service config with a small forest so tests stay fast.
pub fn fast_config() -> ServiceConfig {
    ServiceConfig::builder()
        .forest(ForestConfig::builder().n_trees(12).build().unwrap())
        .build()
        .unwrap()
}

/// The three-row Punjab/Loam dataset plus one Kerala row.
pub fn tiny_table() -> Table {
    Table::builder()
        .categorical("State", vec!["Punjab", "Punjab", "Punjab", "Kerala"])
        .categorical("Soil", vec!["Loam", "Loam", "Loam", "Clay"])
        .numeric("Rainfall", vec![1100.0, 1250.0, 900.0, 3000.0])
        .numeric("Fertilizer", vec![120.0, 140.0, 100.0, 80.0])
        .numeric("Yield", vec![3.1, 3.4, 2.8, 2.2])
        .build()
        .unwrap()
}

pub fn tiny_loader() -> Result<Table, DatasetLoadError> {
    Ok(tiny_table())
}

/// `rows_per_segment` rows for every region/soil pair.
///
/// Yield rises with rainfall and fertilizer and depends on the season; the
/// `Zaid` season never occurs in Odisha.
pub fn synthetic_table(rows_per_segment: usize, seed: u64) -> Table {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let (mut states, mut soils, mut seasons) = (Vec::new(), Vec::new(), Vec::new());
    let (mut rainfall, mut fertilizer, mut yields) = (Vec::new(), Vec::new(), Vec::new());

    for region in REGIONS {
        for soil in SOILS {
            for i in 0..rows_per_segment {
                let season = if region == "Odisha" { SEASONS[i % 2] } else { SEASONS[i % 3] };
                let rain: f64 = rng.gen_range(600.0..2400.0);
                let fert: f64 = rng.gen_range(50.0..200.0);
                let season_bonus = match season {
                    "Kharif" => 0.6,
                    "Rabi" => 0.2,
                    _ => 0.0,
                };
                let noise: f64 = rng.gen_range(-0.05..0.05);

                states.push(Some(region.to_string()));
                soils.push(Some(soil.to_string()));
                seasons.push(Some(season.to_string()));
                rainfall.push(rain);
                fertilizer.push(fert);
                yields.push(1.0 + rain / 1000.0 + fert / 200.0 + season_bonus + noise);
            }
        }
    }

    Table::builder()
        .categorical_opt("State", states)
        .categorical_opt("Soil", soils)
        .categorical_opt("Season", seasons)
        .numeric("Rainfall", rainfall)
        .numeric("Fertilizer", fertilizer)
        .numeric("Yield", yields)
        .build()
        .unwrap()
}
