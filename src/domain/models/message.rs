#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use super::Role;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn new(role: Role, text: &str) -> Message {
        return Message {
            role,
            text: text.to_string(),
        };
    }

    pub fn user(text: &str) -> Message {
        return Message::new(Role::User, text);
    }

    pub fn assistant(text: &str) -> Message {
        return Message::new(Role::Assistant, text);
    }

    pub fn is_user(&self) -> bool {
        return self.role == Role::User;
    }
}
