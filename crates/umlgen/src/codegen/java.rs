//! Java generator: JPA entities and Spring Data / Spring MVC layers

use std::collections::BTreeSet;
use std::path::PathBuf;

use super::generator::{event_methods, service_behaviors, state_literal};
use super::{sql, table_name, Capability, CodeGenerator, SourceSyntax, SourceWriter, TypeToken};
use crate::core::{camel_case, kebab_case, pascal_case, pluralize, MethodNode};
use crate::model::{Cardinality, EnhancedClass, RelationshipDescriptor};

const INDENT: &str = "    ";
const CRUD_METHODS: [&str; 4] = ["findAll", "findById", "save", "deleteById"];

/// Emits Spring Boot flavoured Java
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaGenerator;

impl JavaGenerator {
    pub fn new() -> Self {
        Self
    }

    fn id_type(&self, class: &EnhancedClass) -> String {
        class
            .identifier()
            .map(|id| self.map_type(&id.type_name))
            .unwrap_or_else(|| "Long".to_string())
    }

    fn relationship_type(&self, relation: &RelationshipDescriptor) -> String {
        if relation.is_collection() {
            format!("List<{}>", relation.target)
        } else {
            relation.target.clone()
        }
    }

    fn parameters(&self, method: &MethodNode) -> String {
        method
            .parameters
            .iter()
            .map(|p| format!("{} {}", self.map_type(&p.type_name), p.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn enumeration(&self, class: &EnhancedClass, package: &str) -> String {
        let mut w = SourceWriter::new(INDENT);
        w.line(format!("package {}.entity;", package)).blank();
        w.block(format!("public enum {}", class.name()), |w| {
            let literals: Vec<String> = class.class.literals.iter().map(|l| state_literal(l)).collect();
            if !literals.is_empty() {
                w.line(format!("{};", literals.join(", ")));
            }
        });
        w.finish()
    }

    fn interface(&self, class: &EnhancedClass, package: &str) -> String {
        let mut imports = BTreeSet::new();
        for method in &class.class.methods {
            collect_imports(&self.map_type(&method.return_type), &mut imports);
            for param in &method.parameters {
                collect_imports(&self.map_type(&param.type_name), &mut imports);
            }
        }
        let mut w = SourceWriter::new(INDENT);
        w.line(format!("package {}.entity;", package)).blank();
        write_imports(&mut w, &imports);
        w.block(format!("public interface {}", class.name()), |w| {
            for method in &class.class.methods {
                w.line(format!(
                    "{} {}({});",
                    self.map_type(&method.return_type),
                    method.name,
                    self.parameters(method)
                ));
            }
        });
        w.finish()
    }

    fn field_lines(&self, class: &EnhancedClass, imports: &mut BTreeSet<&'static str>) -> Vec<Vec<String>> {
        let mut fields = Vec::new();
        for field in class.fields() {
            let ty = self.map_type(&field.type_name);
            collect_imports(&ty, imports);
            let mut lines = Vec::new();
            if field.identifier {
                lines.push("@Id".to_string());
                if matches!(ty.as_str(), "Long" | "Integer") {
                    lines.push("@GeneratedValue(strategy = GenerationType.IDENTITY)".to_string());
                }
            } else {
                let mut options = Vec::new();
                if !field.nullable {
                    options.push("nullable = false");
                }
                if field.unique {
                    options.push("unique = true");
                }
                if !options.is_empty() {
                    lines.push(format!("@Column({})", options.join(", ")));
                }
            }
            lines.push(format!("private {} {};", ty, field.name));
            fields.push(lines);
        }

        for relation in &class.relationships {
            let ty = self.relationship_type(relation);
            collect_imports(&ty, imports);
            let mut lines = Vec::new();
            let cascade = if relation.cascade_delete {
                ", cascade = CascadeType.ALL, orphanRemoval = true"
            } else {
                ""
            };
            match (relation.cardinality, &relation.mapped_by) {
                (Cardinality::ManyToOne, _) => {
                    lines.push("@ManyToOne(fetch = FetchType.LAZY)".to_string());
                }
                (Cardinality::OneToMany, Some(mapped_by)) => {
                    lines.push(format!("@OneToMany(mappedBy = \"{}\"{})", mapped_by, cascade));
                }
                (Cardinality::OneToMany, None) => lines.push("@OneToMany".to_string()),
                (Cardinality::OneToOne, Some(mapped_by)) => {
                    lines.push(format!("@OneToOne(mappedBy = \"{}\")", mapped_by));
                }
                (Cardinality::OneToOne, None) if relation.cascade_delete => {
                    lines.push("@OneToOne(cascade = CascadeType.ALL)".to_string());
                }
                (Cardinality::OneToOne, None) => lines.push("@OneToOne".to_string()),
                (Cardinality::ManyToMany, Some(mapped_by)) => {
                    lines.push(format!("@ManyToMany(mappedBy = \"{}\")", mapped_by));
                }
                (Cardinality::ManyToMany, None) => lines.push("@ManyToMany".to_string()),
            }
            if let Some(column) = &relation.join_column {
                lines.push(format!("@JoinColumn(name = \"{}\")", column));
            }
            if let Some(table) = &relation.join_table {
                lines.push(format!("@JoinTable(name = \"{}\")", table));
            }
            if relation.is_collection() {
                imports.insert("java.util.ArrayList");
                lines.push(format!("private {} {} = new ArrayList<>();", ty, relation.field_name));
            } else {
                lines.push(format!("private {} {};", ty, relation.field_name));
            }
            fields.push(lines);
        }

        if let Some(machine) = &class.state_machine {
            fields.push(vec![
                "@Enumerated(EnumType.STRING)".to_string(),
                "@Column(nullable = false)".to_string(),
                format!(
                    "private {} {} = {}.{};",
                    machine.enum_name,
                    machine.field_name,
                    machine.enum_name,
                    state_literal(&machine.initial)
                ),
            ]);
        }
        fields
    }

    fn accessors(&self, class: &EnhancedClass) -> Vec<(String, String, bool)> {
        let mut accessors: Vec<(String, String, bool)> = class
            .fields()
            .map(|f| (self.map_type(&f.type_name), f.name.clone(), true))
            .collect();
        accessors.extend(
            class
                .relationships
                .iter()
                .map(|r| (self.relationship_type(r), r.field_name.clone(), true)),
        );
        if let Some(machine) = &class.state_machine {
            accessors.push((machine.enum_name.clone(), machine.field_name.clone(), false));
        }
        accessors
    }
}

fn collect_imports(ty: &str, imports: &mut BTreeSet<&'static str>) {
    for (needle, import) in [
        ("BigDecimal", "java.math.BigDecimal"),
        ("LocalDateTime", "java.time.LocalDateTime"),
        ("UUID", "java.util.UUID"),
        ("List<", "java.util.List"),
    ] {
        if ty.contains(needle) {
            imports.insert(import);
        }
    }
    if ty.contains("LocalDate") && !ty.contains("LocalDateTime") {
        imports.insert("java.time.LocalDate");
    }
}

fn write_imports(w: &mut SourceWriter, imports: &BTreeSet<&'static str>) {
    if imports.is_empty() {
        return;
    }
    for import in imports {
        w.line(format!("import {};", import));
    }
    w.blank();
}

impl CodeGenerator for JavaGenerator {
    fn language(&self) -> &'static str {
        "java"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["spring", "spring-boot"]
    }

    fn syntax(&self) -> SourceSyntax {
        SourceSyntax::Braces
    }

    fn default_package(&self) -> &'static str {
        "com.example"
    }

    fn output_path(&self, class: &EnhancedClass, capability: Capability, package: &str) -> PathBuf {
        if capability == Capability::Migration {
            return PathBuf::from(format!("src/main/resources/db/schema/{}.sql", table_name(class.name())));
        }
        let mut path = PathBuf::from("src/main/java");
        path.extend(package.split('.').filter(|s| !s.is_empty()));
        path.push(capability.as_str());
        path.push(format!("{}.java", self.type_name(class, capability)));
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
            TypeToken::Text => "String".to_string(),
            TypeToken::Integer => "Integer".to_string(),
            TypeToken::Long => "Long".to_string(),
            TypeToken::Float => "Double".to_string(),
            TypeToken::Decimal => "BigDecimal".to_string(),
            TypeToken::Boolean => "Boolean".to_string(),
            TypeToken::Date => "LocalDate".to_string(),
            TypeToken::DateTime => "LocalDateTime".to_string(),
            TypeToken::Uuid => "UUID".to_string(),
            TypeToken::Void => "void".to_string(),
            TypeToken::Collection(inner) => format!("List<{}>", self.map_type(inner)),
            TypeToken::Named(name) => name.to_string(),
        }
    }

    fn entity(&self, class: &EnhancedClass, package: &str) -> String {
        if class.is_enumeration() {
            return self.enumeration(class, package);
        }
        if class.class.is_interface {
            return self.interface(class, package);
        }

        let mut imports = BTreeSet::from(["jakarta.persistence.*"]);
        let fields = self.field_lines(class, &mut imports);
        for method in &class.class.methods {
            collect_imports(&self.map_type(&method.return_type), &mut imports);
            for param in &method.parameters {
                collect_imports(&self.map_type(&param.type_name), &mut imports);
            }
        }

        let mut header = String::from("public ");
        if class.class.is_abstract {
            header.push_str("abstract ");
        }
        header.push_str("class ");
        header.push_str(class.name());
        if let Some(parent) = &class.class.superclass {
            header.push_str(&format!(" extends {}", parent));
        }
        if !class.class.interfaces.is_empty() {
            header.push_str(&format!(" implements {}", class.class.interfaces.join(", ")));
        }

        let mut w = SourceWriter::new(INDENT);
        w.line(format!("package {}.entity;", package)).blank();
        write_imports(&mut w, &imports);
        if class.class.is_abstract {
            w.line("@MappedSuperclass");
        } else {
            w.line("@Entity");
            w.line(format!("@Table(name = \"{}\")", table_name(class.name())));
        }
        w.block(header, |w| {
            if let Some(machine) = class.state_machine.as_ref().filter(|m| m.embedded_enum) {
                let literals: Vec<String> = machine.states.iter().map(|s| state_literal(s)).collect();
                w.block(format!("public enum {}", machine.enum_name), |w| {
                    w.line(literals.join(", "));
                });
                w.blank();
            }
            for lines in &fields {
                w.lines(lines).blank();
            }

            let mut taken: BTreeSet<String> = BTreeSet::new();
            for (ty, name, setter) in self.accessors(class) {
                let getter = format!("get{}", pascal_case(&name));
                w.block(format!("public {} {}()", ty, getter), |w| {
                    w.line(format!("return {};", name));
                });
                w.blank();
                taken.insert(getter);
                if setter {
                    let setter = format!("set{}", pascal_case(&name));
                    w.block(format!("public void {}({} {})", setter, ty, name), |w| {
                        w.line(format!("this.{} = {};", name, name));
                    });
                    w.blank();
                    taken.insert(setter);
                }
            }

            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    if !taken.insert(event.name.clone()) {
                        continue;
                    }
                    let field = &machine.field_name;
                    w.block(format!("public void {}()", event.name), |w| {
                        for (idx, transition) in event.transitions.iter().enumerate() {
                            let keyword = if idx == 0 { "if" } else { "} else if" };
                            w.line(format!(
                                "{} (this.{} == {}.{}) {{",
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
                            "throw new IllegalStateException(\"Cannot {} from \" + this.{});",
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
                let mut modifiers = String::from("public ");
                if method.is_static {
                    modifiers.push_str("static ");
                }
                let signature = format!(
                    "{} {}({})",
                    self.map_type(&method.return_type),
                    method.name,
                    self.parameters(method)
                );
                if method.is_abstract && class.class.is_abstract {
                    w.line(format!("{}abstract {};", modifiers, signature));
                } else {
                    w.block(format!("{}{}", modifiers, signature), |w| {
                        w.line("throw new UnsupportedOperationException(\"Not implemented\");");
                    });
                }
                w.blank();
            }
        });
        w.finish()
    }

    fn repository(&self, class: &EnhancedClass, package: &str) -> String {
        let name = class.name();
        let id_type = self.id_type(class);
        let mut imports = BTreeSet::from([
            "org.springframework.data.jpa.repository.JpaRepository",
            "org.springframework.stereotype.Repository",
        ]);
        collect_imports(&id_type, &mut imports);

        let mut finders = Vec::new();
        for field in class.fields().filter(|f| f.unique && !f.identifier) {
            let ty = self.map_type(&field.type_name);
            collect_imports(&ty, &mut imports);
            imports.insert("java.util.Optional");
            finders.push(format!(
                "Optional<{}> findBy{}({} {});",
                name,
                pascal_case(&field.name),
                ty,
                field.name
            ));
        }
        if let Some(machine) = &class.state_machine {
            imports.insert("java.util.List");
            finders.push(format!(
                "List<{}> findBy{}({} {});",
                name,
                pascal_case(&machine.field_name),
                machine.enum_name,
                machine.field_name
            ));
        }

        let mut w = SourceWriter::new(INDENT);
        w.line(format!("package {}.repository;", package)).blank();
        w.line(format!("import {}.entity.{};", package, name));
        if let Some(machine) = &class.state_machine {
            if machine.embedded_enum {
                w.line(format!("import {}.entity.{}.{};", package, name, machine.enum_name));
            } else {
                w.line(format!("import {}.entity.{};", package, machine.enum_name));
            }
        }
        write_imports(&mut w, &imports);
        w.line("@Repository");
        w.block(
            format!(
                "public interface {} extends JpaRepository<{}, {}>",
                self.type_name(class, Capability::Repository),
                name,
                id_type
            ),
            |w| {
                w.lines(&finders);
            },
        );
        w.finish()
    }

    fn service(&self, class: &EnhancedClass, package: &str) -> String {
        let name = class.name();
        let var = camel_case(name);
        let repository = self.type_name(class, Capability::Repository);
        let repo_var = camel_case(&repository);
        let id_type = self.id_type(class);
        let behaviors = service_behaviors(class, &CRUD_METHODS);

        let mut imports = BTreeSet::from([
            "java.util.List",
            "java.util.Optional",
            "org.springframework.stereotype.Service",
            "org.springframework.transaction.annotation.Transactional",
        ]);
        collect_imports(&id_type, &mut imports);
        for method in &behaviors {
            collect_imports(&self.map_type(&method.return_type), &mut imports);
            for param in &method.parameters {
                collect_imports(&self.map_type(&param.type_name), &mut imports);
            }
        }

        let mut w = SourceWriter::new(INDENT);
        w.line(format!("package {}.service;", package)).blank();
        w.line(format!("import {}.entity.{};", package, name));
        w.line(format!("import {}.repository.{};", package, repository));
        write_imports(&mut w, &imports);
        w.line("@Service");
        w.line("@Transactional");
        w.block(format!("public class {}", self.type_name(class, Capability::Service)), |w| {
            w.line(format!("private final {} {};", repository, repo_var)).blank();

            w.block(
                format!("public {}({} {})", self.type_name(class, Capability::Service), repository, repo_var),
                |w| {
                    w.line(format!("this.{} = {};", repo_var, repo_var));
                },
            );
            w.blank();
            w.block(format!("public List<{}> findAll()", name), |w| {
                w.line(format!("return {}.findAll();", repo_var));
            });
            w.blank();
            w.block(format!("public Optional<{}> findById({} id)", name, id_type), |w| {
                w.line(format!("return {}.findById(id);", repo_var));
            });
            w.blank();
            w.block(format!("public {} save({} {})", name, name, var), |w| {
                w.line(format!("return {}.save({});", repo_var, var));
            });
            w.blank();
            w.block(format!("public void deleteById({} id)", id_type), |w| {
                w.line(format!("{}.deleteById(id);", repo_var));
            });
            w.blank();

            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    if CRUD_METHODS.contains(&event.name.as_str()) {
                        continue;
                    }
                    w.block(format!("public {} {}({} id)", name, event.name, id_type), |w| {
                        w.line(format!("{} {} = {}.findById(id)", name, var, repo_var));
                        w.line(format!(
                            "{}{}.orElseThrow(() -> new IllegalArgumentException(\"{} not found: \" + id));",
                            INDENT, INDENT, name
                        ));
                        w.line(format!("{}.{}();", var, event.name));
                        w.line(format!("return {}.save({});", repo_var, var));
                    });
                    w.blank();
                }
            }

            for method in behaviors {
                w.block(
                    format!(
                        "public {} {}({})",
                        self.map_type(&method.return_type),
                        method.name,
                        self.parameters(method)
                    ),
                    |w| {
                        for logic in &method.logic {
                            w.line(format!("// {}", logic));
                        }
                        w.line("throw new UnsupportedOperationException(\"Not implemented\");");
                    },
                );
                w.blank();
            }
        });
        w.finish()
    }

    fn controller(&self, class: &EnhancedClass, package: &str) -> String {
        let name = class.name();
        let var = camel_case(name);
        let service = self.type_name(class, Capability::Service);
        let service_var = camel_case(&service);
        let id_type = self.id_type(class);

        let mut imports = BTreeSet::from([
            "java.util.List",
            "org.springframework.http.ResponseEntity",
            "org.springframework.web.bind.annotation.*",
        ]);
        collect_imports(&id_type, &mut imports);

        let mut w = SourceWriter::new(INDENT);
        w.line(format!("package {}.controller;", package)).blank();
        w.line(format!("import {}.entity.{};", package, name));
        w.line(format!("import {}.service.{};", package, service));
        write_imports(&mut w, &imports);
        w.line("@RestController");
        w.line(format!("@RequestMapping(\"/api/{}\")", kebab_case(&pluralize(name))));
        w.block(format!("public class {}", self.type_name(class, Capability::Controller)), |w| {
            w.line(format!("private final {} {};", service, service_var)).blank();
            w.block(
                format!("public {}({} {})", self.type_name(class, Capability::Controller), service, service_var),
                |w| {
                    w.line(format!("this.{} = {};", service_var, service_var));
                },
            );
            w.blank();
            w.line("@GetMapping");
            w.block(format!("public List<{}> list()", name), |w| {
                w.line(format!("return {}.findAll();", service_var));
            });
            w.blank();
            w.line("@GetMapping(\"/{id}\")");
            w.block(format!("public ResponseEntity<{}> get(@PathVariable {} id)", name, id_type), |w| {
                w.line(format!("return {}.findById(id)", service_var));
                w.line(format!("{}{}.map(ResponseEntity::ok)", INDENT, INDENT));
                w.line(format!("{}{}.orElse(ResponseEntity.notFound().build());", INDENT, INDENT));
            });
            w.blank();
            w.line("@PostMapping");
            w.block(format!("public {} create(@RequestBody {} {})", name, name, var), |w| {
                w.line(format!("return {}.save({});", service_var, var));
            });
            w.blank();
            w.line("@DeleteMapping(\"/{id}\")");
            w.block(format!("public void delete(@PathVariable {} id)", id_type), |w| {
                w.line(format!("{}.deleteById(id);", service_var));
            });
            w.blank();
            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    if CRUD_METHODS.contains(&event.name.as_str()) {
                        continue;
                    }
                    w.line(format!("@PostMapping(\"/{{id}}/{}\")", kebab_case(&event.name)));
                    w.block(format!("public {} {}(@PathVariable {} id)", name, event.name, id_type), |w| {
                        w.line(format!("return {}.{}(id);", service_var, event.name));
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
    use crate::core::{AttributeNode, ClassNode, StateBlock, StateTransition};
    use crate::model::StateMachine;

    fn invoice() -> EnhancedClass {
        let mut class = ClassNode::new("Invoice");
        class.attributes.push(AttributeNode::new("number", "String"));
        class.attributes.push(AttributeNode::new("total", "Float"));
        EnhancedClass::new(class)
    }

    fn post() -> EnhancedClass {
        let mut class = EnhancedClass::new(ClassNode::new("Post"));
        let block = StateBlock {
            initial: Some("Draft".into()),
            states: vec!["Draft".into(), "Published".into()],
            transitions: vec![StateTransition {
                from: "Draft".into(),
                event: "publish".into(),
                to: "Published".into(),
            }],
            ..Default::default()
        };
        class.state_machine = StateMachine::from_block(&block, "PostStatus");
        class
    }

    #[test]
    fn test_entity_has_exactly_declared_fields() {
        let source = JavaGenerator::new().entity(&invoice(), "com.acme");
        assert!(source.starts_with("package com.acme.entity;\n"));
        assert!(source.contains("@Table(name = \"invoices\")"));
        assert!(source.contains("    private String number;"));
        assert!(source.contains("    private Double total;"));
        assert_eq!(source.matches("    private ").count(), 2);
        assert!(!source.contains("@ManyToOne"));
    }

    #[test]
    fn test_entity_guards_transitions() {
        let source = JavaGenerator::new().entity(&post(), "com.acme");
        assert!(source.contains("public enum PostStatus {"));
        assert!(source.contains("private PostStatus status = PostStatus.DRAFT;"));
        assert!(source.contains("if (this.status == PostStatus.DRAFT) {"));
        assert!(source.contains("throw new IllegalStateException(\"Cannot publish from \" + this.status);"));
        assert!(!source.contains("setStatus"));
    }

    #[test]
    fn test_paths_follow_package() {
        let java = JavaGenerator::new();
        let class = invoice();
        assert_eq!(
            java.output_path(&class, Capability::Service, "com.acme"),
            PathBuf::from("src/main/java/com/acme/service/InvoiceService.java")
        );
        assert_eq!(
            java.output_path(&class, Capability::Migration, "com.acme"),
            PathBuf::from("src/main/resources/db/schema/invoices.sql")
        );
    }

    #[test]
    fn test_service_and_controller_expose_events() {
        let java = JavaGenerator::new();
        let service = java.service(&post(), "com.acme");
        assert!(service.contains("public Post publish(Long id) {"));
        let controller = java.controller(&post(), "com.acme");
        assert!(controller.contains("@RequestMapping(\"/api/posts\")"));
        assert!(controller.contains("@PostMapping(\"/{id}/publish\")"));
    }
}
