#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Commands whose whole remainder is taken verbatim as a form field value.
pub(crate) const FIELD_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "name",
        action: "set_name",
    },
    CommandSpec {
        command: "prompt",
        action: "set_prompt",
    },
    CommandSpec {
        command: "photo",
        action: "set_photo",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "save",
    action: "save_photo",
}];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "surprise",
        action: "surprise_me",
    },
    CommandSpec {
        command: "generate",
        action: "generate",
    },
    CommandSpec {
        command: "share",
        action: "submit",
    },
    CommandSpec {
        command: "show",
        action: "show",
    },
    CommandSpec {
        command: "wait",
        action: "wait",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/name",
    "/prompt",
    "/photo",
    "/surprise",
    "/generate",
    "/share",
    "/show",
    "/save",
    "/wait",
    "/help",
    "/quit",
];
