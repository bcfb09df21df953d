//! TypeScript generator: TypeORM entities and NestJS layers

use std::collections::BTreeSet;
use std::path::PathBuf;

use super::generator::{event_methods, service_behaviors, state_literal};
use super::{sql, table_name, Capability, CodeGenerator, SourceSyntax, SourceWriter, TypeToken};
use crate::core::{camel_case, kebab_case, pascal_case, pluralize, MethodNode};
use crate::model::{Cardinality, EnhancedClass, RelationshipDescriptor};

const INDENT: &str = "  ";
const CRUD_METHODS: [&str; 4] = ["findAll", "findOne", "create", "remove"];

/// Emits TypeORM entities with NestJS repositories, services and controllers
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptGenerator;

impl TypeScriptGenerator {
    pub fn new() -> Self {
        Self
    }

    fn file_stem(class: &str) -> String {
        kebab_case(class)
    }

    fn id_field(&self, class: &EnhancedClass) -> (String, String) {
        class
            .identifier()
            .map(|id| (id.name.clone(), self.map_type(&id.type_name)))
            .unwrap_or_else(|| ("id".to_string(), "number".to_string()))
    }

    fn parameters(&self, method: &MethodNode) -> String {
        method
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, self.map_type(&p.type_name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn relationship_lines(&self, relation: &RelationshipDescriptor) -> Vec<String> {
        let target = &relation.target;
        let target_var = camel_case(target);
        let back = relation
            .mapped_by
            .as_ref()
            .map(|m| format!(", ({}) => {}.{}", target_var, target_var, m));
        let mut options = Vec::new();
        if relation.cascade_delete {
            if relation.owner && relation.cardinality == Cardinality::ManyToOne {
                options.push("onDelete: 'CASCADE'");
            } else if !relation.owner {
                options.push("cascade: true");
            }
        }
        let options = if options.is_empty() {
            String::new()
        } else {
            format!(", {{ {} }}", options.join(", "))
        };
        let decorator = match relation.cardinality {
            Cardinality::ManyToOne => "ManyToOne",
            Cardinality::OneToMany => "OneToMany",
            Cardinality::OneToOne => "OneToOne",
            Cardinality::ManyToMany => "ManyToMany",
        };
        let mut lines = vec![format!(
            "@{}(() => {}{}{})",
            decorator,
            target,
            back.unwrap_or_default(),
            options
        )];
        if let Some(column) = &relation.join_column {
            lines.push(format!("@JoinColumn({{ name: '{}' }})", column));
        }
        if let Some(table) = &relation.join_table {
            lines.push(format!("@JoinTable({{ name: '{}' }})", table));
        }
        let ty = if relation.is_collection() {
            format!("{}[]", target)
        } else {
            target.clone()
        };
        lines.push(format!("{}: {};", relation.field_name, ty));
        lines
    }
}

impl CodeGenerator for TypeScriptGenerator {
    fn language(&self) -> &'static str {
        "typescript"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["ts", "typeorm", "nestjs"]
    }

    fn syntax(&self) -> SourceSyntax {
        SourceSyntax::Braces
    }

    fn default_package(&self) -> &'static str {
        "src"
    }

    fn output_path(&self, class: &EnhancedClass, capability: Capability, package: &str) -> PathBuf {
        let mut path = PathBuf::from(package);
        let stem = Self::file_stem(class.name());
        match capability {
            Capability::Entity => path.push(format!("entities/{}.entity.ts", stem)),
            Capability::Repository => path.push(format!("repositories/{}.repository.ts", stem)),
            Capability::Service => path.push(format!("services/{}.service.ts", stem)),
            Capability::Controller => path.push(format!("controllers/{}.controller.ts", stem)),
            Capability::Migration => path.push(format!("migrations/{}.sql", table_name(class.name()))),
        }
        path
    }

    fn type_name(&self, class: &EnhancedClass, capability: Capability) -> String {
        match capability {
            Capability::Entity | Capability::Migration => class.name().to_string(),
            other => format!("{}{}", class.name(), pascal_case(other.as_str())),
        }
    }

    fn map_type(&self, token: &str) -> String {
        match TypeToken::classify(token) {
            TypeToken::Text | TypeToken::Uuid => "string".to_string(),
            TypeToken::Integer | TypeToken::Long | TypeToken::Float | TypeToken::Decimal => {
                "number".to_string()
            }
            TypeToken::Boolean => "boolean".to_string(),
            TypeToken::Date | TypeToken::DateTime => "Date".to_string(),
            TypeToken::Void => "void".to_string(),
            TypeToken::Collection(inner) => format!("{}[]", self.map_type(inner)),
            TypeToken::Named(name) => name.to_string(),
        }
    }

    fn entity(&self, class: &EnhancedClass, _package: &str) -> String {
        let mut w = SourceWriter::new(INDENT);
        if class.is_enumeration() {
            w.block(format!("export enum {}", class.name()), |w| {
                for literal in &class.class.literals {
                    let literal = state_literal(literal);
                    w.line(format!("{} = '{}',", literal, literal));
                }
            });
            return w.finish();
        }
        if class.class.is_interface {
            w.block(format!("export interface {}", class.name()), |w| {
                for method in &class.class.methods {
                    w.line(format!(
                        "{}({}): {};",
                        method.name,
                        self.parameters(method),
                        self.map_type(&method.return_type)
                    ));
                }
            });
            return w.finish();
        }

        let mut decorators: BTreeSet<&'static str> = BTreeSet::new();
        if !class.class.is_abstract {
            decorators.insert("Entity");
        }
        let mut members: Vec<Vec<String>> = Vec::new();

        for field in class.fields() {
            let ty = self.map_type(&field.type_name);
            let mut lines = Vec::new();
            if field.identifier {
                if ty == "number" {
                    decorators.insert("PrimaryGeneratedColumn");
                    lines.push("@PrimaryGeneratedColumn()".to_string());
                } else {
                    decorators.insert("PrimaryColumn");
                    lines.push("@PrimaryColumn()".to_string());
                }
                lines.push(format!("{}: {};", field.name, ty));
            } else {
                decorators.insert("Column");
                let mut options = Vec::new();
                if field.nullable {
                    options.push("nullable: true");
                }
                if field.unique {
                    options.push("unique: true");
                }
                if options.is_empty() {
                    lines.push("@Column()".to_string());
                } else {
                    lines.push(format!("@Column({{ {} }})", options.join(", ")));
                }
                if field.nullable {
                    lines.push(format!("{}: {} | null;", field.name, ty));
                } else {
                    lines.push(format!("{}: {};", field.name, ty));
                }
            }
            members.push(lines);
        }

        let mut related: BTreeSet<&str> = BTreeSet::new();
        for relation in &class.relationships {
            decorators.insert(match relation.cardinality {
                Cardinality::ManyToOne => "ManyToOne",
                Cardinality::OneToMany => "OneToMany",
                Cardinality::OneToOne => "OneToOne",
                Cardinality::ManyToMany => "ManyToMany",
            });
            if relation.join_column.is_some() {
                decorators.insert("JoinColumn");
            }
            if relation.join_table.is_some() {
                decorators.insert("JoinTable");
            }
            if relation.target != class.name() {
                related.insert(&relation.target);
            }
            members.push(self.relationship_lines(relation));
        }

        if let Some(machine) = &class.state_machine {
            decorators.insert("Column");
            if !machine.embedded_enum {
                related.insert(&machine.enum_name);
            }
            members.push(vec![
                format!(
                    "@Column({{ type: 'varchar', default: {}.{} }})",
                    machine.enum_name,
                    state_literal(&machine.initial)
                ),
                format!(
                    "{}: {} = {}.{};",
                    machine.field_name,
                    machine.enum_name,
                    machine.enum_name,
                    state_literal(&machine.initial)
                ),
            ]);
        }
        if let Some(parent) = &class.class.superclass {
            related.insert(parent);
        }

        w.line(format!(
            "import {{ {} }} from 'typeorm';",
            decorators.iter().copied().collect::<Vec<_>>().join(", ")
        ));
        for name in &related {
            w.line(format!("import {{ {} }} from './{}.entity';", name, Self::file_stem(name)));
        }
        w.blank();

        if let Some(machine) = class.state_machine.as_ref().filter(|m| m.embedded_enum) {
            w.block(format!("export enum {}", machine.enum_name), |w| {
                for state in &machine.states {
                    let literal = state_literal(state);
                    w.line(format!("{} = '{}',", literal, literal));
                }
            });
            w.blank();
        }

        if !class.class.is_abstract {
            w.line(format!("@Entity('{}')", table_name(class.name())));
        }
        let mut header = String::from("export ");
        if class.class.is_abstract {
            header.push_str("abstract ");
        }
        header.push_str(&format!("class {}", class.name()));
        if let Some(parent) = &class.class.superclass {
            header.push_str(&format!(" extends {}", parent));
        }
        if !class.class.interfaces.is_empty() {
            header.push_str(&format!(" implements {}", class.class.interfaces.join(", ")));
        }

        w.block(header, |w| {
            for lines in &members {
                w.lines(lines).blank();
            }
            let mut taken: BTreeSet<String> = BTreeSet::new();
            if let Some(machine) = &class.state_machine {
                let field = &machine.field_name;
                for event in event_methods(machine) {
                    if !taken.insert(event.name.clone()) {
                        continue;
                    }
                    w.block(format!("{}(): void", event.name), |w| {
                        for (idx, transition) in event.transitions.iter().enumerate() {
                            let keyword = if idx == 0 { "if" } else { "} else if" };
                            w.line(format!(
                                "{} (this.{} === {}.{}) {{",
                                keyword,
                                field,
                                machine.enum_name,
                                state_literal(&transition.from)
                            ));
                            w.indent();
                            w.line(format!(
                                "this.{} = {}.{};",
                                field,
                                machine.enum_name,
                                state_literal(&transition.to)
                            ));
                            w.dedent();
                        }
                        w.line("} else {");
                        w.indent();
                        w.line(format!(
                            "throw new Error(`Cannot {} from ${{this.{}}}`);",
                            event.event, field
                        ));
                        w.dedent();
                        w.line("}");
                    });
                    w.blank();
                }
            }
            for method in &class.class.methods {
                if !taken.insert(method.name.clone()) {
                    continue;
                }
                let mut modifiers = String::new();
                if method.is_static {
                    modifiers.push_str("static ");
                }
                let signature = format!(
                    "{}({}): {}",
                    method.name,
                    self.parameters(method),
                    self.map_type(&method.return_type)
                );
                if method.is_abstract && class.class.is_abstract {
                    w.line(format!("abstract {}{};", modifiers, signature));
                } else {
                    w.block(format!("{}{}", modifiers, signature), |w| {
                        w.line("throw new Error('Not implemented');");
                    });
                }
                w.blank();
            }
        });
        w.finish()
    }

    fn repository(&self, class: &EnhancedClass, _package: &str) -> String {
        let name = class.name();
        let (id_name, id_type) = self.id_field(class);
        let lookup = if id_name == "id" {
            "{ id }".to_string()
        } else {
            format!("{{ {}: id }}", id_name)
        };

        let mut w = SourceWriter::new(INDENT);
        w.line("import { Injectable } from '@nestjs/common';");
        w.line("import { InjectRepository } from '@nestjs/typeorm';");
        w.line("import { Repository } from 'typeorm';");
        w.line(format!("import {{ {} }} from '../entities/{}.entity';", name, Self::file_stem(name)));
        w.blank();
        w.line("@Injectable()");
        w.block(format!("export class {}", self.type_name(class, Capability::Repository)), |w| {
            w.line(format!(
                "constructor(@InjectRepository({}) private readonly repository: Repository<{}>) {{}}",
                name, name
            ));
            w.blank();
            w.block(format!("findAll(): Promise<{}[]>", name), |w| {
                w.line("return this.repository.find();");
            });
            w.blank();
            w.block(format!("findById(id: {}): Promise<{} | null>", id_type, name), |w| {
                w.line(format!("return this.repository.findOneBy({});", lookup));
            });
            w.blank();
            for field in class.fields().filter(|f| f.unique && !f.identifier) {
                let ty = self.map_type(&field.type_name);
                w.block(
                    format!("findBy{}({}: {}): Promise<{} | null>", pascal_case(&field.name), field.name, ty, name),
                    |w| {
                        w.line(format!("return this.repository.findOneBy({{ {} }});", field.name));
                    },
                );
                w.blank();
            }
            w.block(format!("save(entity: {}): Promise<{}>", name, name), |w| {
                w.line("return this.repository.save(entity);");
            });
            w.blank();
            w.block(format!("async delete(id: {}): Promise<void>", id_type), |w| {
                w.line("await this.repository.delete(id);");
            });
        });
        w.finish()
    }

    fn service(&self, class: &EnhancedClass, _package: &str) -> String {
        let name = class.name();
        let var = camel_case(name);
        let repository = self.type_name(class, Capability::Repository);
        let (_, id_type) = self.id_field(class);
        let behaviors = service_behaviors(class, &CRUD_METHODS);

        let mut w = SourceWriter::new(INDENT);
        w.line("import { Injectable, NotFoundException } from '@nestjs/common';");
        w.line(format!("import {{ {} }} from '../entities/{}.entity';", name, Self::file_stem(name)));
        w.line(format!(
            "import {{ {} }} from '../repositories/{}.repository';",
            repository,
            Self::file_stem(name)
        ));
        w.blank();
        w.line("@Injectable()");
        w.block(format!("export class {}", self.type_name(class, Capability::Service)), |w| {
            w.line(format!("constructor(private readonly repository: {}) {{}}", repository));
            w.blank();
            w.block(format!("findAll(): Promise<{}[]>", name), |w| {
                w.line("return this.repository.findAll();");
            });
            w.blank();
            w.block(format!("async findOne(id: {}): Promise<{}>", id_type, name), |w| {
                w.line(format!("const {} = await this.repository.findById(id);", var));
                w.block(format!("if (!{})", var), |w| {
                    w.line(format!("throw new NotFoundException(`{} ${{id}} not found`);", name));
                });
                w.line(format!("return {};", var));
            });
            w.blank();
            w.block(format!("create({}: {}): Promise<{}>", var, name, name), |w| {
                w.line(format!("return this.repository.save({});", var));
            });
            w.blank();
            w.block(format!("remove(id: {}): Promise<void>", id_type), |w| {
                w.line("return this.repository.delete(id);");
            });
            w.blank();
            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    if CRUD_METHODS.contains(&event.name.as_str()) {
                        continue;
                    }
                    w.block(format!("async {}(id: {}): Promise<{}>", event.name, id_type, name), |w| {
                        w.line(format!("const {} = await this.findOne(id);", var));
                        w.line(format!("{}.{}();", var, event.name));
                        w.line(format!("return this.repository.save({});", var));
                    });
                    w.blank();
                }
            }
            for method in behaviors {
                let returns = self.map_type(&method.return_type);
                w.block(
                    format!("async {}({}): Promise<{}>", method.name, self.parameters(method), returns),
                    |w| {
                        for logic in &method.logic {
                            w.line(format!("// {}", logic));
                        }
                        w.line("throw new Error('Not implemented');");
                    },
                );
                w.blank();
            }
        });
        w.finish()
    }

    fn controller(&self, class: &EnhancedClass, _package: &str) -> String {
        let name = class.name();
        let var = camel_case(name);
        let service = self.type_name(class, Capability::Service);
        let (_, id_type) = self.id_field(class);
        let id = if id_type == "number" { "Number(id)" } else { "id" };

        let mut w = SourceWriter::new(INDENT);
        w.line("import { Body, Controller, Delete, Get, Param, Post } from '@nestjs/common';");
        w.line(format!("import {{ {} }} from '../entities/{}.entity';", name, Self::file_stem(name)));
        w.line(format!(
            "import {{ {} }} from '../services/{}.service';",
            service,
            Self::file_stem(name)
        ));
        w.blank();
        w.line(format!("@Controller('{}')", kebab_case(&pluralize(name))));
        w.block(format!("export class {}", self.type_name(class, Capability::Controller)), |w| {
            w.line(format!("constructor(private readonly service: {}) {{}}", service));
            w.blank();
            w.line("@Get()");
            w.block(format!("findAll(): Promise<{}[]>", name), |w| {
                w.line("return this.service.findAll();");
            });
            w.blank();
            w.line("@Get(':id')");
            w.block(format!("findOne(@Param('id') id: string): Promise<{}>", name), |w| {
                w.line(format!("return this.service.findOne({});", id));
            });
            w.blank();
            w.line("@Post()");
            w.block(format!("create(@Body() {}: {}): Promise<{}>", var, name, name), |w| {
                w.line(format!("return this.service.create({});", var));
            });
            w.blank();
            w.line("@Delete(':id')");
            w.block("remove(@Param('id') id: string): Promise<void>", |w| {
                w.line(format!("return this.service.remove({});", id));
            });
            w.blank();
            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    if CRUD_METHODS.contains(&event.name.as_str()) {
                        continue;
                    }
                    w.line(format!("@Post(':id/{}')", kebab_case(&event.name)));
                    w.block(format!("{}(@Param('id') id: string): Promise<{}>", event.name, name), |w| {
                        w.line(format!("return this.service.{}({});", event.name, id));
                    });
                    w.blank();
                }
            }
        });
        w.finish()
    }

    fn migration(&self, class: &EnhancedClass, _package: &str) -> String {
        sql::create_table(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttributeNode, ClassNode};

    #[test]
    fn test_entity_uses_typeorm_decorators() {
        let mut class = ClassNode::new("Invoice");
        class.attributes.push(AttributeNode::new("number", "String"));
        class.attributes.push(AttributeNode::new("total", "Float"));
        let source = TypeScriptGenerator::new().entity(&EnhancedClass::new(class), "src");
        assert!(source.starts_with("import { Column, Entity } from 'typeorm';\n"));
        assert!(source.contains("@Entity('invoices')\nexport class Invoice {"));
        assert!(source.contains("  number: string;"));
        assert!(source.contains("  total: number;"));
    }

    #[test]
    fn test_relationship_imports_target_entity() {
        let mut class = EnhancedClass::new(ClassNode::new("Order"));
        class.relationships.push(RelationshipDescriptor {
            field_name: "customer".into(),
            target: "Customer".into(),
            cardinality: Cardinality::ManyToOne,
            owner: true,
            mapped_by: None,
            inversed_by: None,
            join_column: Some("customer_id".into()),
            join_table: None,
            cascade_delete: false,
        });
        let source = TypeScriptGenerator::new().entity(&class, "src");
        assert!(source.contains("import { Customer } from './customer.entity';"));
        assert!(source.contains("@ManyToOne(() => Customer)\n  @JoinColumn({ name: 'customer_id' })\n  customer: Customer;"));
    }

    #[test]
    fn test_paths_are_kebab_cased() {
        let ts = TypeScriptGenerator::new();
        let class = EnhancedClass::new(ClassNode::new("OrderLine"));
        assert_eq!(
            ts.output_path(&class, Capability::Entity, "src"),
            PathBuf::from("src/entities/order-line.entity.ts")
        );
        assert_eq!(
            ts.output_path(&class, Capability::Controller, "src"),
            PathBuf::from("src/controllers/order-line.controller.ts")
        );
    }
}
