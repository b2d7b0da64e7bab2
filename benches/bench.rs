// Criterion benchmarks for Pug or Ugh

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pugorugh::core::{matches_preference, select_next, PreferenceFilter};
use pugorugh::models::{AgeBucket, DecisionStatus, Dog, Gender, Preference, Size};
use pugorugh::SelectionCriteria;
use std::collections::HashMap;

const GENDERS: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unknown];
const SIZES: [Size; 5] = [Size::Small, Size::Medium, Size::Large, Size::ExtraLarge, Size::Unknown];

fn create_dog(id: i64) -> Dog {
    let i = id as usize;
    Dog {
        id,
        name: format!("Dog {}", id),
        image_reference: format!("{}.jpg", id),
        breed: "Mixed".to_string(),
        age_months: (i * 7 % 200) as i32,
        gender: GENDERS[i % GENDERS.len()],
        size: SIZES[i % SIZES.len()],
        requires_behavioral_assessment: i % 11 == 0,
        medical_needs: String::new(),
    }
}

fn create_preference() -> Preference {
    Preference {
        id: 1,
        user_id: 1,
        genders: [Gender::Female].into_iter().collect(),
        age_buckets: [AgeBucket::Young, AgeBucket::Adult].into_iter().collect(),
        sizes: [Size::Medium, Size::Large].into_iter().collect(),
        requires_behavioral_assessment: false,
    }
}

fn bench_matches_preference(c: &mut Criterion) {
    let filter = PreferenceFilter::from(&create_preference());
    let dog = create_dog(42);

    c.bench_function("matches_preference", |b| {
        b.iter(|| matches_preference(black_box(&dog), black_box(&filter)));
    });
}

fn bench_select_next(c: &mut Criterion) {
    let criteria = SelectionCriteria::preferred(&create_preference());

    let mut group = c.benchmark_group("select_next");

    for catalog_size in [100, 1_000, 10_000].iter() {
        let dogs: Vec<Dog> = (1..=*catalog_size as i64).map(create_dog).collect();
        // Roughly a third of the catalog already swiped
        let decisions: HashMap<i64, DecisionStatus> = dogs
            .iter()
            .filter(|dog| dog.id % 3 == 0)
            .map(|dog| (dog.id, DecisionStatus::Disliked))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("preferred", catalog_size),
            catalog_size,
            |b, _| {
                b.iter(|| {
                    select_next(
                        black_box(&dogs),
                        black_box(-1),
                        &criteria,
                        |id| decisions.get(&id).copied(),
                    )
                });
            },
        );

        // Cursor near the end exercises the skip path
        let cursor = *catalog_size as i64 - 50;
        group.bench_with_input(
            BenchmarkId::new("preferred_late_cursor", catalog_size),
            catalog_size,
            |b, _| {
                b.iter(|| {
                    select_next(
                        black_box(&dogs),
                        black_box(cursor),
                        &criteria,
                        |id| decisions.get(&id).copied(),
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_matches_preference, bench_select_next);

criterion_main!(benches);
