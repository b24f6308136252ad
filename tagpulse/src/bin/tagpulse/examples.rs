use crate::commands::{analytics, comment, engagement, feed, post, seed, user};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "seed",
            groups: seed::EXAMPLES,
        },
        CommandExample {
            name: "user",
            groups: user::EXAMPLES,
        },
        CommandExample {
            name: "post",
            groups: post::EXAMPLES,
        },
        CommandExample {
            name: "comment",
            groups: comment::EXAMPLES,
        },
        CommandExample {
            name: "like",
            groups: engagement::EXAMPLES,
        },
        CommandExample {
            name: "unlike",
            groups: engagement::EXAMPLES,
        },
        CommandExample {
            name: "bookmark",
            groups: engagement::EXAMPLES,
        },
        CommandExample {
            name: "unbookmark",
            groups: engagement::EXAMPLES,
        },
        CommandExample {
            name: "feed",
            groups: feed::EXAMPLES,
        },
        CommandExample {
            name: "analytics",
            groups: analytics::EXAMPLES,
        },
    ]
}
