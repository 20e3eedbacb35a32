//! Editable text with placeholders.
//!
//! A [`Text`] keeps its content as a list of chunks. Plain chunks are copied
//! verbatim; `{name}` chunks are live [`Argument`]s that render as the text
//! of whatever `name` resolves to, or as the raw placeholder when nothing
//! does:
//!
//! ```text
//! "You have booked a flight on {T1}."
//!   -> ["You have booked a flight on ", {T1}, "."]
//! ```
//!
//! When connected through `target`, the Text mirrors the target: edits are
//! written through and updates of the target are copied back.

use automat_core::{Argument, Automat, LocationId, Object, Precondition};

static TARGET: Argument = Argument::new("target", Precondition::Optional);

#[derive(Clone, Debug)]
enum Chunk {
    Literal(String),
    Placeholder(Argument),
}

fn parse_chunks(text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|close| open + close) else {
            break;
        };
        if open > 0 {
            chunks.push(Chunk::Literal(rest[..open].to_string()));
        }
        let name = &rest[open + 1..close];
        chunks.push(Chunk::Placeholder(Argument::named(name, Precondition::Optional)));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        chunks.push(Chunk::Literal(rest.to_string()));
    }
    chunks
}

/// Text field.
#[derive(Clone, Debug, Default)]
pub struct Text {
    chunks: Vec<Chunk>,
}

impl Text {
    /// Creates a Text with the given content.
    ///
    /// Placeholders only start observing their targets once the Text is
    /// placed in a Location.
    pub fn new(text: &str) -> Self {
        Self {
            chunks: parse_chunks(text),
        }
    }

    /// Names of the placeholders, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().filter_map(|chunk| match chunk {
            Chunk::Placeholder(arg) => Some(arg.name()),
            Chunk::Literal(_) => None,
        })
    }

    fn visit_placeholders(&self, visit: &mut dyn FnMut(&Argument)) {
        for chunk in &self.chunks {
            if let Chunk::Placeholder(arg) = chunk {
                visit(arg);
            }
        }
    }

    fn replace_content(&mut self, rt: &mut Automat, here: LocationId, text: &str) {
        self.visit_placeholders(&mut |arg| arg.detach(rt, here));
        self.chunks = parse_chunks(text);
        self.visit_placeholders(&mut |arg| arg.attach(rt, here));
    }
}

impl Object for Text {
    fn name(&self) -> &str {
        "Text"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn text(&self, rt: &Automat, here: LocationId) -> String {
        let mut out = String::new();
        for chunk in &self.chunks {
            match chunk {
                Chunk::Literal(text) => out.push_str(text),
                Chunk::Placeholder(arg) => match arg.find_object(rt, here) {
                    Some(object) => out.push_str(&rt.text(object)),
                    None => {
                        out.push('{');
                        out.push_str(arg.name());
                        out.push('}');
                    }
                },
            }
        }
        out
    }

    fn set_text(&mut self, rt: &mut Automat, here: LocationId, text: &str) {
        if self.text(rt, here) == text {
            return;
        }
        self.replace_content(rt, here, text);
        if let Some(target) = TARGET.find_location(rt, here).location {
            rt.set_text(target, text);
        }
    }

    fn updated(&mut self, rt: &mut Automat, here: LocationId, updated: LocationId) {
        if TARGET.find_location(rt, here).location == Some(updated) {
            let text = rt.text(updated);
            self.set_text(rt, here, &text);
        } else {
            // A placeholder changed, so the rendered text did too.
            rt.schedule_update(here);
        }
    }

    fn args(&self, visit: &mut dyn FnMut(&Argument)) {
        visit(&TARGET);
        self.visit_placeholders(visit);
    }
}
