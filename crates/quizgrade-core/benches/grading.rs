use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizgrade_core::grader::Grader;
use quizgrade_core::matcher::{detect_concepts, similarity};
use quizgrade_core::model::{AnswerKey, AnswerSpec, Question, RawField};

fn risk_groups() -> Vec<Vec<String>> {
    let raw: [&[&str]; 8] = [
        &["cortes", "corte"],
        &["caídas", "caidas", "caída", "caida"],
        &["atrapamiento", "atrapado"],
        &["quemaduras", "quemadura"],
        &["ruido"],
        &["eléctrico", "electrico", "electricidad", "corriente"],
        &["incendios", "incendio", "fuego"],
        &["móviles", "moviles", "equipos", "vehículos"],
    ];
    raw.iter()
        .map(|g| g.iter().map(|s| s.to_string()).collect())
        .collect()
}

fn make_grader() -> Grader {
    let mut questions: Vec<Question> = (0..10)
        .map(|i| {
            Question::new(
                format!("true-false-{i}"),
                AnswerSpec::ExactChoice {
                    expected: "Verdadero".into(),
                },
            )
        })
        .collect();
    questions.push(Question::new(
        "riesgos",
        AnswerSpec::OpenConcept {
            minimum: 3,
            groups: risk_groups(),
        },
    ));
    Grader::new(AnswerKey::from_questions(questions).unwrap())
}

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");

    group.bench_function("short", |b| {
        b.iter(|| similarity(black_box("quemadras"), black_box("quemaduras")))
    });

    group.bench_function("long", |b| {
        b.iter(|| {
            similarity(
                black_box("electricidadestatica"),
                black_box("electricidad_estática"),
            )
        })
    });

    group.finish();
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_concepts");
    let groups = risk_groups();

    let short = "Cortes, caidas y ruido";
    let long = "Durante el turno puedo sufrir cortes con cuchillos, caídas por piso mojado, \
                quemaduras con vapor, atrapamiento en la cinta transportadora, ruido \
                excesivo en la sala de máquinas y riesgo eléctrico en los tableros."
        .repeat(5);

    group.bench_function("short", |b| {
        b.iter(|| detect_concepts(black_box(short), black_box(&groups)))
    });

    group.bench_function("long", |b| {
        b.iter(|| detect_concepts(black_box(&long), black_box(&groups)))
    });

    group.finish();
}

fn bench_grade(c: &mut Criterion) {
    let mut group = c.benchmark_group("grade");
    let grader = make_grader();

    let mut fields: Vec<RawField> = (0..10)
        .map(|i| RawField::single_choice(format!("true-false-{i}"), Some("Verdadero")))
        .collect();
    fields.push(RawField::text(
        "riesgos",
        Some("cortes, quemaduras y fuego en la planta"),
    ));

    group.bench_function("full_submission", |b| {
        b.iter(|| grader.grade_fields(black_box(&fields)))
    });

    let empty: Vec<RawField> = Vec::new();
    group.bench_function("empty_submission", |b| {
        b.iter(|| grader.grade_fields(black_box(&empty)))
    });

    group.finish();
}

criterion_group!(benches, bench_similarity, bench_detect, bench_grade);
criterion_main!(benches);
