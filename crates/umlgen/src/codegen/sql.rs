//! `CREATE TABLE` scripts shared by the emitters' migration capability

use super::{table_name, SourceWriter, TypeToken};
use crate::model::{Cardinality, EnhancedClass};
use crate::core::screaming_snake_case;

fn column_type(token: &str) -> &'static str {
    match TypeToken::classify(token) {
        TypeToken::Text | TypeToken::Named(_) | TypeToken::Void | TypeToken::Collection(_) => {
            "VARCHAR(255)"
        }
        TypeToken::Integer => "INTEGER",
        TypeToken::Long => "BIGINT",
        TypeToken::Float => "DOUBLE PRECISION",
        TypeToken::Decimal => "NUMERIC(19, 2)",
        TypeToken::Boolean => "BOOLEAN",
        TypeToken::Date => "DATE",
        TypeToken::DateTime => "TIMESTAMP",
        TypeToken::Uuid => "UUID",
    }
}

/// A `CREATE TABLE` script for one class, plus join tables it owns
pub fn create_table(class: &EnhancedClass) -> String {
    let table = table_name(class.name());
    let mut columns: Vec<String> = Vec::new();

    if class.identifier().is_none() {
        columns.push("id BIGINT PRIMARY KEY".to_string());
    }
    for field in class.fields() {
        let mut column = format!("{} {}", crate::core::snake_case(&field.name), column_type(&field.type_name));
        if field.identifier {
            column.push_str(" PRIMARY KEY");
        } else {
            if !field.nullable {
                column.push_str(" NOT NULL");
            }
            if field.unique {
                column.push_str(" UNIQUE");
            }
        }
        columns.push(column);
    }
    for relation in class.relationships.iter().filter(|r| r.owner) {
        if let Some(join_column) = &relation.join_column {
            let mut column = format!(
                "{} BIGINT REFERENCES {}(id)",
                join_column,
                table_name(&relation.target)
            );
            if relation.cascade_delete {
                column.push_str(" ON DELETE CASCADE");
            }
            if relation.cardinality == Cardinality::OneToOne {
                column.push_str(" UNIQUE");
            }
            columns.push(column);
        }
    }
    if let Some(machine) = &class.state_machine {
        columns.push(format!(
            "{} VARCHAR(32) NOT NULL DEFAULT '{}'",
            crate::core::snake_case(&machine.field_name),
            screaming_snake_case(&machine.initial)
        ));
    }

    let mut w = SourceWriter::new("    ");
    w.line(format!("-- Table for {}", class.name()));
    w.line(format!("CREATE TABLE {} (", table));
    w.indent();
    let last = columns.len().saturating_sub(1);
    for (idx, column) in columns.iter().enumerate() {
        w.line(if idx == last { column.clone() } else { format!("{},", column) });
    }
    w.dedent();
    w.line(");");

    for relation in class.relationships.iter().filter(|r| r.owner) {
        let Some(join_table) = &relation.join_table else {
            continue;
        };
        let own = crate::core::snake_case(class.name());
        let other = crate::core::snake_case(&relation.target);
        w.blank();
        w.line(format!("CREATE TABLE {} (", join_table));
        w.indent();
        w.line(format!("{}_id BIGINT NOT NULL REFERENCES {}(id),", own, table));
        w.line(format!(
            "{}_id BIGINT NOT NULL REFERENCES {}(id),",
            other,
            table_name(&relation.target)
        ));
        w.line(format!("PRIMARY KEY ({}_id, {}_id)", own, other));
        w.dedent();
        w.line(");");
    }
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttributeNode, ClassNode};

    #[test]
    fn test_create_table_columns() {
        let mut class = ClassNode::new("Invoice");
        let mut number = AttributeNode::new("number", "String");
        number.unique = true;
        class.attributes.push(number);
        class.attributes.push(AttributeNode::new("totalAmount", "Float"));
        let sql = create_table(&EnhancedClass::new(class));
        assert!(sql.contains("CREATE TABLE invoices ("));
        assert!(sql.contains("    id BIGINT PRIMARY KEY,"));
        assert!(sql.contains("    number VARCHAR(255) NOT NULL UNIQUE,"));
        assert!(sql.contains("    total_amount DOUBLE PRECISION NOT NULL\n);"));
    }
}
