use criterion::{Criterion, black_box, criterion_group, criterion_main};

use tonerdesk_auth::{Identity, Privilege, Role, Session, evaluate};
use tonerdesk_console::{ConsoleConfig, console_routes, visible_entries};
use tonerdesk_core::UserId;

fn bench_resolve(c: &mut Criterion) {
    let table = console_routes(&ConsoleConfig::default()).expect("stock routes are valid");

    c.bench_function("resolve_nested_admin_path", |b| {
        b.iter(|| table.resolve(black_box("/admin/users/create/draft?tab=2")))
    });

    c.bench_function("resolve_unknown_path", |b| {
        b.iter(|| table.resolve(black_box("/totally/unknown/path")))
    });
}

fn bench_policy(c: &mut Criterion) {
    let table = console_routes(&ConsoleConfig::default()).expect("stock routes are valid");
    let admin = Session::authenticated(Identity::new(UserId::new(), "Bench"), Role::Admin, None);

    c.bench_function("evaluate_admin", |b| {
        b.iter(|| evaluate(black_box(&admin), black_box(Privilege::Admin)))
    });

    c.bench_function("visible_entries_admin", |b| {
        b.iter(|| visible_entries(black_box(&admin), &table).len())
    });
}

criterion_group!(benches, bench_resolve, bench_policy);
criterion_main!(benches);
