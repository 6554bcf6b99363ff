//! Predicate and parser throughput over a synthetic message cache.
//!
//! Run with: cargo bench

#![allow(missing_docs)] // criterion macros generate undocumented items

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use narrow_filter::model::{
    ChannelId, Message, MessageId, NarrowContext, Person, RealmSettings, Subscription, UserId,
};
use narrow_filter::parser::parse;
use narrow_filter::snapshot::InMemoryWorkspace;
use narrow_filter::Filter;

const NUM_MESSAGES: u64 = 50_000;
const NUM_CHANNELS: u64 = 20;
const NUM_USERS: u64 = 50;

fn generate_messages() -> Vec<Message> {
    (0..NUM_MESSAGES)
        .map(|i| {
            let sender = UserId::new(i % NUM_USERS + 1);
            if i % 5 == 0 {
                Message::direct(MessageId::new(i), sender, vec![UserId::new(1), sender])
            } else {
                Message::channel(
                    MessageId::new(i),
                    sender,
                    ChannelId::new(i % NUM_CHANNELS + 100),
                    format!("topic {}", i % 37),
                )
                .with_content(if i % 7 == 0 {
                    r#"<p><a href="https://example.com">link</a></p>"#
                } else {
                    "<p>plain</p>"
                })
            }
        })
        .collect()
}

fn context() -> NarrowContext {
    let mut workspace = InMemoryWorkspace::new()
        .with_current_user(Person::new(UserId::new(1), "user1@example.com", "User 1"));
    for user in 2..=NUM_USERS {
        workspace = workspace.with_user(Person::new(
            UserId::new(user),
            format!("user{user}@example.com"),
            format!("User {user}"),
        ));
    }
    for channel in 100..100 + NUM_CHANNELS {
        workspace = workspace.with_channel(Subscription::new(
            ChannelId::new(channel),
            format!("channel-{channel}"),
        ));
    }
    workspace.into_context(RealmSettings::default())
}

fn bench_predicates(c: &mut Criterion) {
    let messages = generate_messages();
    let ctx = context();

    let queries = [
        ("channel_topic", "channel:105 topic:\"topic 3\""),
        ("dm", "dm:user2@example.com"),
        ("has_link_not_sender", "has:link -sender:user3@example.com"),
        ("is_dm", "is:dm"),
    ];

    for (name, query) in queries {
        let filter = Filter::from_query(query, ctx.clone());
        let predicate = filter.predicate();
        c.bench_function(&format!("predicate_{name}_50k"), |b| {
            b.iter(|| {
                let count = messages.iter().filter(|m| predicate(*m)).count();
                black_box(count)
            });
        });
    }
}

fn bench_parse(c: &mut Criterion) {
    let ctx = context();
    let query = "stream:channel-105 subject:\"topic 3\" -is:muted has:images from:me lunch plans";
    c.bench_function("parse_mixed_query", |b| {
        b.iter(|| black_box(parse(black_box(query), false, ctx.people.as_ref())));
    });
}

criterion_group!(benches, bench_predicates, bench_parse);
criterion_main!(benches);
