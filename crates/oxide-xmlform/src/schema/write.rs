//! [`SchemaTree`] to markup conversion.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{NodeId, SchemaTree};
use crate::error::Result;

enum Step {
    Open(NodeId),
    Close(NodeId),
}

impl SchemaTree {
    /// Serializes the tree as indented XML.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        let mut steps = vec![Step::Open(self.root)];

        while let Some(step) = steps.pop() {
            match step {
                Step::Open(id) => self.write_start(&mut writer, id, &mut steps)?,
                Step::Close(id) => {
                    writer.write_event(Event::End(BytesEnd::new(self.tag(id))))?;
                }
            }
        }
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    fn write_start(&self, writer: &mut Writer<Vec<u8>>, id: NodeId, steps: &mut Vec<Step>) -> Result<()> {
        let mut start = BytesStart::new(self.tag(id));
        for (key, value) in self.attributes(id) {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        let text = self.text(id);
        let children = self.children(id);
        if text.is_empty() && children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if !text.is_empty() {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        steps.push(Step::Close(id));
        steps.extend(children.iter().rev().map(|child| Step::Open(*child)));
        Ok(())
    }
}
