//! Generic copying of any [`Node`] into an assembler.

use strata_core::{Error, Kind, ListIterator, MapIterator, Node};

use super::NodeAssembler;

/// Drive `na` with the content of `node`, one assembler call per value.
///
/// Absent map values are skipped, which leaves optional fields unset.
pub(super) fn replay<N: Node>(na: &mut NodeAssembler<'_>, node: &N) -> Result<(), Error> {
    match node.kind() {
        Kind::Null if node.is_absent() => Err(na.h.fail(Error::unmatchable(
            na.type_name(),
            "an absent value cannot be assigned",
        ))),
        Kind::Null => na.assign_null(),
        Kind::Bool => na.assign_bool(node.as_bool()?),
        Kind::Int => na.assign_int(node.as_int()?),
        Kind::Float => na.assign_float(node.as_float()?),
        Kind::String => na.assign_string(&node.as_string()?),
        Kind::Bytes => na.assign_bytes(&node.as_bytes()?),
        Kind::Link => na.assign_link(&node.as_link()?),
        Kind::List => {
            let mut list = na.begin_list(node.length())?;
            let mut items = node.list_iterator()?;
            while !items.done() {
                let (_, item) = items.next_item()?;
                list.assemble_value()?.assign_node(&item)?;
            }
            list.finish()
        }
        Kind::Map => {
            let mut map = na.begin_map(node.length())?;
            let mut entries = node.map_iterator()?;
            while !entries.done() {
                let (key, value) = entries.next_entry()?;
                if value.is_absent() {
                    continue;
                }
                map.assemble_key().assign_node(&key)?;
                map.assemble_value().assign_node(&value)?;
            }
            map.finish()
        }
    }
}
