/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Re-fetch vacancies from the server",
  },
  Command {
    name: "sort",
    aliases: &["s", "order"],
    description: "sort <created|company|title|location|status>",
  },
  Command {
    name: "filter",
    aliases: &["f", "company"],
    description: "filter <company>, empty to reset",
  },
  Command {
    name: "unselect",
    aliases: &["u", "deselect"],
    description: "Close the detail panel",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit jobdesk",
  },
];

/// A submitted command line split into its command name and argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub name: String,
  pub argument: String,
}

impl Invocation {
  /// Split `input` at the first whitespace
  pub fn parse(input: &str) -> Self {
    let input = input.trim();
    let (name, argument) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
    Self {
      name: name.to_lowercase(),
      argument: argument.trim().to_string(),
    }
  }
}

/// Get autocomplete suggestions for a given input. Only the command word is
/// matched; anything after the first space is an argument.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = Invocation::parse(input).name;

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    let priority = if cmd.name == input_lower {
      0
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      1
    } else if cmd.name.starts_with(&input_lower) {
      2
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      3
    } else if cmd.name.contains(&input_lower) {
      4
    } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      5
    } else {
      continue;
    };
    matches.push((cmd, priority));
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("refresh");
    assert_eq!(suggestions[0].name, "refresh");
  }

  #[test]
  fn test_alias_beats_prefix() {
    // "s" is an alias of sort and nothing else starts with it
    let suggestions = get_suggestions("s");
    assert_eq!(suggestions[0].name, "sort");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("uns");
    assert_eq!(suggestions[0].name, "unselect");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("fres");
    assert_eq!(suggestions[0].name, "refresh");
  }

  #[test]
  fn test_argument_is_ignored_for_matching() {
    let suggestions = get_suggestions("sort company");
    assert_eq!(suggestions[0].name, "sort");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("xyz").is_empty());
  }

  #[test]
  fn test_parse_invocation() {
    assert_eq!(
      Invocation::parse("  Sort   Company "),
      Invocation {
        name: "sort".to_string(),
        argument: "Company".to_string(),
      }
    );
    assert_eq!(Invocation::parse("quit").argument, "");
  }
}
