// Criterion benchmarks for Refuge Matcher

use chrono::{DateTime, Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use refuge_matcher::core::{evaluate_pair, solve, CostMatrix, Matcher, PairingHistory, ScoringParams};
use refuge_matcher::models::{
    DurationCategory, GroupRelation, GuestListing, HostListing, ScoringWeights, ShelterType,
};

const CITIES: [&str; 4] = ["warsaw", "krakow", "gdansk", "lodz"];

fn create_host(id: usize, now: DateTime<Utc>) -> HostListing {
    HostListing {
        id: format!("h{id}"),
        registered_at: now - Duration::hours((id % 72) as i64),
        country: "poland".to_string(),
        city: Some(CITIES[id % CITIES.len()].to_string()),
        shelter_type: if id % 2 == 0 { ShelterType::Flat } else { ShelterType::Room },
        beds: 1 + (id % 5) as u32,
        acceptable_group_relations: [
            GroupRelation::Couple,
            GroupRelation::MotherWithChildren,
            GroupRelation::FamilyWithChildren,
        ]
        .into_iter()
        .collect(),
        ok_for_pregnant: id % 3 != 0,
        ok_for_disabilities: true,
        ok_for_animals: id % 4 == 0,
        ok_for_elderly: true,
        ok_for_any_nationality: true,
        duration_category: DurationCategory::Month,
        transport_included: id % 2 == 1,
    }
}

fn create_guest(id: usize, now: DateTime<Utc>) -> GuestListing {
    GuestListing {
        id: format!("g{id}"),
        registered_at: now - Duration::hours((id % 48) as i64),
        country: "poland".to_string(),
        city: if id % 5 == 0 { None } else { Some(CITIES[id % CITIES.len()].to_string()) },
        beds: 1 + (id % 4) as u32,
        is_pregnant: id % 7 == 0,
        is_with_disability: false,
        is_with_animal: id % 6 == 0,
        is_with_elderly: false,
        group_relation: if id % 2 == 0 { GroupRelation::Couple } else { GroupRelation::MotherWithChildren },
        acceptable_shelter_types: [ShelterType::Flat, ShelterType::Room].into_iter().collect(),
        is_ukrainian_nationality: true,
        duration_category: DurationCategory::TwoToThreeWeeks,
    }
}

fn bench_evaluate_pair(c: &mut Criterion) {
    let now = Utc::now();
    let host = create_host(1, now);
    let guest = create_guest(2, now);
    let history = PairingHistory::default();
    let params = ScoringParams {
        weights: ScoringWeights::default(),
        now,
        match_timeout_hours: 24,
        activity_boost: true,
    };

    c.bench_function("evaluate_pair", |b| {
        b.iter(|| evaluate_pair(black_box(&host), black_box(&guest), &history, &params));
    });
}

fn bench_assignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("assignment");

    for size in [10, 25, 50].iter() {
        let matrix = CostMatrix::from_fn(*size, *size, |i, j| {
            if (i * 7 + j * 3) % 5 == 0 {
                0.0
            } else {
                -0.79 - ((i * 31 + j * 17) % 21) as f64 / 100.0
            }
        });

        group.bench_with_input(BenchmarkId::new("solve", size), size, |b, _| {
            b.iter(|| solve(black_box(&matrix)));
        });
    }

    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let now = Utc::now();
    let matcher = Matcher::default();
    let history = PairingHistory::default();

    let mut group = c.benchmark_group("matching");

    for (hosts_count, guests_count) in [(10, 20), (25, 50), (50, 50)].iter() {
        let hosts: Vec<HostListing> = (0..*hosts_count).map(|i| create_host(i, now)).collect();
        let guests: Vec<GuestListing> = (0..*guests_count).map(|i| create_guest(i, now)).collect();

        group.bench_with_input(
            BenchmarkId::new("find_matches", format!("{hosts_count}x{guests_count}")),
            &(hosts_count, guests_count),
            |b, _| {
                b.iter(|| {
                    matcher.find_matches(black_box(&hosts), black_box(&guests), &history, now)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate_pair, bench_assignment, bench_matching);

criterion_main!(benches);
