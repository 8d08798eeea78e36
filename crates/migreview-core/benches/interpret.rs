//! Benchmarks for prompt building and response interpretation.
//!
//! Both run once per review, so they only matter if they regress badly on
//! large schemas or long answers.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use migreview_core::llm::parse::{extract_json, interpret};
use migreview_core::llm::prompt::build_prompt;
use migreview_core::{OutputMode, Session};

/// A structured answer with `n` violations, wrapped in prose and a fence.
fn fenced_answer(violations: usize) -> String {
    let items: Vec<String> = (0..violations)
        .map(|i| {
            format!(
                r#"{{"rule": "rule {i}", "severity": {}, "description": "violation {i}", "recommendation": "fix {i}"}}"#,
                i % 101
            )
        })
        .collect();

    format!(
        r#"以下がレビュー結果です。
```json
{{
  "general_analysis": {{
    "data_loss_risk": {{"score": 10, "description": "a"}},
    "performance_impact": {{"score": 20, "description": "b"}},
    "downtime_required": {{"score": 30, "description": "c"}}
  }},
  "rulebook_analysis": {{"violations": [{}]}},
  "overall_score": 40,
  "execution_recommendation": "要注意",
  "summary": "s"
}}
```
以上です。"#,
        items.join(",\n")
    )
}

/// A schema with `n` tables.
fn wide_schema(tables: usize) -> String {
    (0..tables)
        .map(|i| format!("CREATE TABLE t{i} (\n  id BIGINT PRIMARY KEY,\n  name TEXT NOT NULL\n);\n"))
        .collect()
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpret/extract_json");
    for size in [1usize, 50, 500] {
        let answer = fenced_answer(size);
        group.throughput(Throughput::Bytes(answer.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &answer, |b, answer| {
            b.iter(|| extract_json(answer));
        });
    }
    group.finish();
}

fn bench_interpret(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpret/structured");
    for size in [1usize, 50, 500] {
        let answer = fenced_answer(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &answer, |b, answer| {
            b.iter(|| interpret(answer, OutputMode::Structured).unwrap());
        });
    }
    group.finish();
}

fn bench_build_prompt(c: &mut Criterion) {
    let mut group = c.benchmark_group("prompt/build");
    let session = Session::new();
    for tables in [10usize, 200] {
        let request = session.review_request(
            wide_schema(tables),
            "ALTER TABLE t0 ADD COLUMN note TEXT;",
            OutputMode::Structured,
        );
        group.bench_with_input(BenchmarkId::from_parameter(tables), &request, |b, request| {
            b.iter(|| build_prompt(request));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract, bench_interpret, bench_build_prompt);
criterion_main!(benches);
