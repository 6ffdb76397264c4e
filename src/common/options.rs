use serenity::all::{ResolvedOption, ResolvedValue, Role};

#[derive(Debug, Clone)]
pub struct Options<'a> {
    pub options: Vec<ResolvedOption<'a>>,
}

impl<'a> Options<'a> {
    /// Finds an option by name, looking inside the invoked subcommand.
    fn find(options: &[ResolvedOption<'a>], name: &str) -> Option<ResolvedValue<'a>> {
        for option in options {
            match &option.value {
                ResolvedValue::SubCommandGroup(sub_options)
                | ResolvedValue::SubCommand(sub_options) => {
                    return Self::find(sub_options, name);
                }
                value if option.name == name => return Some(value.clone()),
                _ => continue,
            }
        }
        None
    }

    pub fn subcommand(&self) -> Option<&str> {
        self.options.iter().find_map(|option| match option.value {
            ResolvedValue::SubCommand(_) | ResolvedValue::SubCommandGroup(_) => Some(option.name),
            _ => None,
        })
    }

    pub fn get_role(&self, name: &str) -> Option<Role> {
        match Self::find(&self.options, name)? {
            ResolvedValue::Role(role) => Some(role.clone()),
            _ => None,
        }
    }

    pub fn get_string(&self, name: &str) -> Option<String> {
        match Self::find(&self.options, name)? {
            ResolvedValue::String(string) => Some(string.to_string()),
            _ => None,
        }
    }

    pub fn get_boolean(&self, name: &str) -> Option<bool> {
        match Self::find(&self.options, name)? {
            ResolvedValue::Boolean(boolean) => Some(boolean),
            _ => None,
        }
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        match Self::find(&self.options, name)? {
            ResolvedValue::Integer(integer) => Some(integer),
            _ => None,
        }
    }
}
