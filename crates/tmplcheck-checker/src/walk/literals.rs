//! Constant operands.

use tmplcheck_core::{BasicKind, CheckError, CheckErrorKind, TypeId};
use tmplcheck_parser::{Node, NumberKind, NumberNode, Tree};

use super::Walker;

impl Walker<'_> {
    /// Untyped constant type of a literal node.
    pub(super) fn literal(&self, tree: &Tree, node: &Node) -> Result<TypeId, CheckError> {
        let kind = match node {
            Node::Bool(_) => BasicKind::UntypedBool,
            Node::String(_) => BasicKind::UntypedString,
            Node::Nil(_) => BasicKind::UntypedNil,
            Node::Number(number) => self.number_kind(tree, node, number)?,
            _ => {
                return Err(self.error(
                    tree,
                    node.span(),
                    node,
                    CheckErrorKind::NotAFunction {
                        node: node.to_string(),
                    },
                ));
            }
        };
        Ok(self.types.basic(kind))
    }

    fn number_kind(
        &self,
        tree: &Tree,
        node: &Node,
        number: &NumberNode,
    ) -> Result<BasicKind, CheckError> {
        match number.kind {
            NumberKind::Int => match number.int_value() {
                Some(_) => Ok(BasicKind::UntypedInt),
                None => Err(self.error(
                    tree,
                    number.span,
                    node,
                    CheckErrorKind::IntegerOverflow {
                        text: number.text.clone(),
                    },
                )),
            },
            NumberKind::Rune => Ok(BasicKind::UntypedRune),
            NumberKind::Float => Ok(BasicKind::UntypedFloat),
            NumberKind::Complex => Ok(BasicKind::UntypedComplex),
        }
    }
}
