use std::collections::HashMap;

/// Renders several error messages as one stable summary.
///
/// Identical messages are grouped, groups are ordered by how often they
/// occurred and ties keep the order in which messages were first seen. A
/// single message is returned as is.
pub fn default_format_errors(messages: &[String]) -> String {
    if let [message] = messages {
        return message.clone();
    }

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut occurrences: Vec<(&str, usize)> = Vec::new();
    for message in messages {
        match positions.get(message.as_str()) {
            Some(position) => occurrences[*position].1 += 1,
            None => {
                positions.insert(message, occurrences.len());
                occurrences.push((message, 1));
            }
        }
    }

    // stable: equal counts stay in discovery order
    occurrences.sort_by(|a, b| b.1.cmp(&a.1));

    let mut summary = String::new();
    for (message, count) in occurrences {
        summary.push_str(&format!(" * {} {}\n", count, message));
    }

    format!("{} errors occurred:\n{}\n", messages.len(), summary)
}
