use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use phrasedrill::bank::{PhraseBank, PhraseRecord};
use phrasedrill::engine::diff::annotate;
use phrasedrill::engine::grader::grade;
use phrasedrill::engine::normalize::normalize;
use phrasedrill::engine::question::{ActiveQuestion, QuizMode};
use phrasedrill::engine::selector::{SelectorSettings, pick_next};
use phrasedrill::store::ledger::{MemoryStore, MistakeLedger};

fn make_bank(count: usize) -> PhraseBank {
    PhraseBank::from_rows((0..count).filter_map(|i| {
        PhraseRecord::from_cells(
            &format!("phrase {i}"),
            &format!("Sentence number {i} uses ___ in the middle."),
            &format!("answer {i}"),
            &format!("meaning {}", i % 40),
        )
    }))
}

fn bench_normalize(c: &mut Criterion) {
    let text = "  She GAVE up smoking,   after years of trying!  ";
    c.bench_function("normalize (short sentence)", |b| {
        b.iter(|| normalize(black_box(text)))
    });
}

fn bench_grade(c: &mut Criterion) {
    let bank = make_bank(500);
    let question = ActiveQuestion {
        item: bank.phrases[123].clone(),
        mode: QuizMode::Speaking,
        is_review: false,
        options: Vec::new(),
    };

    c.bench_function("grade speaking answer (miss with diff)", |b| {
        b.iter(|| {
            grade(
                black_box(&question),
                &bank.synonyms,
                black_box("sentence number 132 use answers in a middle"),
            )
        })
    });
}

fn bench_annotate(c: &mut Criterion) {
    let given = "the quick brwn fox jumpd over the lazy dgo again and again";
    let target = "The quick brown fox jumped over the lazy dog, again and again.";
    c.bench_function("annotate (60 chars)", |b| {
        b.iter(|| annotate(black_box(given), black_box(target)))
    });
}

fn bench_pick_next(c: &mut Criterion) {
    let bank = make_bank(2_000);
    let keys: Vec<String> = (0..200).map(|i| format!("phrase {}", i * 7)).collect();
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let mut ledger = MistakeLedger::load(Box::new(MemoryStore::with_keys(&key_refs)));
    let settings = SelectorSettings::default();
    let mut rng = SmallRng::seed_from_u64(42);

    c.bench_function("pick_next (2000 phrases, 200 mistakes)", |b| {
        b.iter(|| pick_next(&bank, &mut ledger, &settings, &mut rng))
    });
}

criterion_group!(
    benches,
    bench_normalize,
    bench_grade,
    bench_annotate,
    bench_pick_next
);
criterion_main!(benches);
