//! C# generator: EF Core entities and ASP.NET Core layers

use std::collections::BTreeSet;
use std::path::PathBuf;

use super::generator::{event_methods, service_behaviors};
use super::{sql, table_name, Capability, CodeGenerator, SourceSyntax, SourceWriter, TypeToken};
use crate::core::{camel_case, kebab_case, pascal_case, pluralize, MethodNode};
use crate::model::{Cardinality, EnhancedClass, StateMachine};

const INDENT: &str = "    ";
const CRUD_METHODS: [&str; 4] = ["FindAllAsync", "FindByIdAsync", "SaveAsync", "DeleteAsync"];

/// Emits EF Core entities with ASP.NET Core repositories, services and controllers
#[derive(Debug, Default, Clone, Copy)]
pub struct CSharpGenerator;

impl CSharpGenerator {
    pub fn new() -> Self {
        Self
    }

    fn id_type(&self, class: &EnhancedClass) -> String {
        class
            .identifier()
            .map(|id| self.map_type(&id.type_name))
            .unwrap_or_else(|| "long".to_string())
    }

    fn parameters(&self, method: &MethodNode) -> String {
        method
            .parameters
            .iter()
            .map(|p| format!("{} {}", self.map_type(&p.type_name), camel_case(&p.name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn namespace(package: &str, layer: &str) -> String {
        format!("{}.{}", package, layer)
    }

    fn state(machine: &StateMachine, state: &str) -> String {
        format!("{}.{}", machine.enum_name, pascal_case(state))
    }

    fn enumeration(&self, class: &EnhancedClass, package: &str) -> String {
        let mut w = SourceWriter::new(INDENT);
        w.line(format!("namespace {};", Self::namespace(package, "Entities"))).blank();
        w.braced(format!("public enum {}", class.name()), |w| {
            let literals: Vec<String> = class.class.literals.iter().map(|l| pascal_case(l)).collect();
            let last = literals.len().saturating_sub(1);
            for (idx, literal) in literals.iter().enumerate() {
                w.line(if idx == last { literal.clone() } else { format!("{},", literal) });
            }
        });
        w.finish()
    }

    fn interface(&self, class: &EnhancedClass, package: &str) -> String {
        let mut w = SourceWriter::new(INDENT);
        w.line(format!("namespace {};", Self::namespace(package, "Entities"))).blank();
        w.braced(format!("public interface {}", class.name()), |w| {
            for method in &class.class.methods {
                w.line(format!(
                    "{} {}({});",
                    self.map_type(&method.return_type),
                    pascal_case(&method.name),
                    self.parameters(method)
                ));
            }
        });
        w.finish()
    }

    fn transition(&self, w: &mut SourceWriter, machine: &StateMachine, name: &str, event: &str, from_to: &[(&str, &str)]) {
        let property = pascal_case(&machine.field_name);
        w.braced(format!("public void {}()", name), |w| {
            for (idx, (from, to)) in from_to.iter().enumerate() {
                let keyword = if idx == 0 { "if" } else { "else if" };
                w.line(format!("{} ({} == {})", keyword, property, Self::state(machine, from)));
                w.line("{");
                w.indent();
                w.line(format!("{} = {};", property, Self::state(machine, to)));
                w.dedent();
                w.line("}");
            }
            w.line("else");
            w.line("{");
            w.indent();
            w.line(format!(
                "throw new InvalidOperationException($\"Cannot {} from {{{}}}\");",
                event, property
            ));
            w.dedent();
            w.line("}");
        });
    }
}

impl CodeGenerator for CSharpGenerator {
    fn language(&self) -> &'static str {
        "csharp"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["cs", "dotnet", "efcore"]
    }

    fn syntax(&self) -> SourceSyntax {
        SourceSyntax::Braces
    }

    fn default_package(&self) -> &'static str {
        "Example"
    }

    fn output_path(&self, class: &EnhancedClass, capability: Capability, _package: &str) -> PathBuf {
        match capability {
            Capability::Entity => PathBuf::from(format!("Entities/{}.cs", class.name())),
            Capability::Migration => PathBuf::from(format!("Migrations/{}.sql", table_name(class.name()))),
            other => PathBuf::from(format!(
                "{}/{}.cs",
                pluralize(&pascal_case(other.as_str())),
                self.type_name(class, other)
            )),
        }
    }

    fn type_name(&self, class: &EnhancedClass, capability: Capability) -> String {
        match capability {
            Capability::Entity | Capability::Migration => class.name().to_string(),
            other => format!("{}{}", class.name(), pascal_case(other.as_str())),
        }
    }

    fn map_type(&self, token: &str) -> String {
        match TypeToken::classify(token) {
            TypeToken::Text => "string".to_string(),
            TypeToken::Integer => "int".to_string(),
            TypeToken::Long => "long".to_string(),
            TypeToken::Float => "double".to_string(),
            TypeToken::Decimal => "decimal".to_string(),
            TypeToken::Boolean => "bool".to_string(),
            TypeToken::Date => "DateOnly".to_string(),
            TypeToken::DateTime => "DateTime".to_string(),
            TypeToken::Uuid => "Guid".to_string(),
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

        let mut properties: Vec<Vec<String>> = Vec::new();
        for field in class.fields() {
            let ty = self.map_type(&field.type_name);
            let mut lines = Vec::new();
            if field.identifier {
                lines.push("[Key]".to_string());
            } else if !field.nullable && ty == "string" {
                lines.push("[Required]".to_string());
            }
            let name = pascal_case(&field.name);
            let initializer = if ty == "string" && !field.nullable {
                " = string.Empty;"
            } else if ty.starts_with("List<") {
                " = new();"
            } else {
                ""
            };
            let ty = if field.nullable { format!("{}?", ty) } else { ty };
            lines.push(format!("public {} {} {{ get; set; }}{}", ty, name, initializer));
            properties.push(lines);
        }

        let mut index_attributes: Vec<String> = class
            .fields()
            .filter(|f| f.unique && !f.identifier)
            .map(|f| format!("[Index(nameof({}), IsUnique = true)]", pascal_case(&f.name)))
            .collect();

        for relation in &class.relationships {
            let property = pascal_case(&relation.field_name);
            let mut lines = Vec::new();
            if let Some(column) = &relation.join_column {
                let key = format!("{}Id", property);
                properties.push(vec![
                    format!("[Column(\"{}\")]", column),
                    format!("public long? {} {{ get; set; }}", key),
                ]);
                lines.push(format!("[ForeignKey(nameof({}))]", key));
            }
            if let Some(mapped_by) = &relation.mapped_by {
                lines.push(format!("[InverseProperty(\"{}\")]", pascal_case(mapped_by)));
            }
            let line = match relation.cardinality {
                Cardinality::OneToMany | Cardinality::ManyToMany => format!(
                    "public List<{}> {} {{ get; set; }} = new();",
                    relation.target, property
                ),
                Cardinality::ManyToOne | Cardinality::OneToOne => {
                    format!("public {}? {} {{ get; set; }}", relation.target, property)
                }
            };
            lines.push(line);
            properties.push(lines);
        }

        if let Some(machine) = &class.state_machine {
            properties.push(vec![format!(
                "public {} {} {{ get; private set; }} = {};",
                machine.enum_name,
                pascal_case(&machine.field_name),
                Self::state(machine, &machine.initial)
            )]);
        }

        let mut usings: BTreeSet<&str> = BTreeSet::from([
            "System.ComponentModel.DataAnnotations",
            "System.ComponentModel.DataAnnotations.Schema",
        ]);
        if !index_attributes.is_empty() {
            usings.insert("Microsoft.EntityFrameworkCore");
        }

        let mut header = String::from("public ");
        if class.class.is_abstract {
            header.push_str("abstract ");
        }
        header.push_str(&format!("class {}", class.name()));
        let mut bases: Vec<String> = class.class.superclass.iter().cloned().collect();
        bases.extend(class.class.interfaces.iter().cloned());
        if !bases.is_empty() {
            header.push_str(&format!(" : {}", bases.join(", ")));
        }

        let mut w = SourceWriter::new(INDENT);
        for using in &usings {
            w.line(format!("using {};", using));
        }
        w.blank();
        w.line(format!("namespace {};", Self::namespace(package, "Entities"))).blank();
        w.lines(index_attributes.drain(..));
        if !class.class.is_abstract {
            w.line(format!("[Table(\"{}\")]", table_name(class.name())));
        }
        w.braced(header, |w| {
            if let Some(machine) = class.state_machine.as_ref().filter(|m| m.embedded_enum) {
                let literals: Vec<String> = machine.states.iter().map(|s| pascal_case(s)).collect();
                w.line(format!("public enum {} {{ {} }}", machine.enum_name, literals.join(", ")));
                w.blank();
            }
            for lines in &properties {
                w.lines(lines).blank();
            }

            let mut taken: BTreeSet<String> = BTreeSet::new();
            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    let name = pascal_case(&event.name);
                    if !taken.insert(name.clone()) {
                        continue;
                    }
                    let from_to: Vec<(&str, &str)> = event
                        .transitions
                        .iter()
                        .map(|t| (t.from.as_str(), t.to.as_str()))
                        .collect();
                    self.transition(w, machine, &name, event.event, &from_to);
                    w.blank();
                }
            }
            for method in &class.class.methods {
                let name = pascal_case(&method.name);
                if !taken.insert(name.clone()) {
                    continue;
                }
                let mut modifiers = String::from("public ");
                if method.is_static {
                    modifiers.push_str("static ");
                }
                let signature = format!(
                    "{} {}({})",
                    self.map_type(&method.return_type),
                    name,
                    self.parameters(method)
                );
                if method.is_abstract && class.class.is_abstract {
                    w.line(format!("{}abstract {};", modifiers, signature));
                } else {
                    w.braced(format!("{}{}", modifiers, signature), |w| {
                        w.line("throw new NotImplementedException();");
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
        let mut w = SourceWriter::new(INDENT);
        w.line("using Microsoft.EntityFrameworkCore;");
        w.line(format!("using {};", Self::namespace(package, "Entities")));
        w.blank();
        w.line(format!("namespace {};", Self::namespace(package, "Repositories"))).blank();
        w.braced(format!("public class {}", self.type_name(class, Capability::Repository)), |w| {
            w.line("private readonly DbContext _context;").blank();
            w.braced(
                format!("public {}(DbContext context)", self.type_name(class, Capability::Repository)),
                |w| {
                    w.line("_context = context;");
                },
            );
            w.blank();
            w.line(format!(
                "public Task<List<{}>> FindAllAsync() => _context.Set<{}>().ToListAsync();",
                name, name
            ));
            w.blank();
            w.line(format!(
                "public ValueTask<{}?> FindByIdAsync({} id) => _context.Set<{}>().FindAsync(id);",
                name, id_type, name
            ));
            w.blank();
            for field in class.fields().filter(|f| f.unique && !f.identifier) {
                let property = pascal_case(&field.name);
                let param = camel_case(&field.name);
                w.line(format!(
                    "public Task<{}?> FindBy{}Async({} {}) => _context.Set<{}>().FirstOrDefaultAsync(e => e.{} == {});",
                    name,
                    property,
                    self.map_type(&field.type_name),
                    param,
                    name,
                    property,
                    param
                ));
                w.blank();
            }
            w.braced(format!("public async Task<{}> SaveAsync({} entity)", name, name), |w| {
                w.line("if (_context.Entry(entity).State == EntityState.Detached)");
                w.line("{");
                w.indent();
                w.line("_context.Add(entity);");
                w.dedent();
                w.line("}");
                w.line("await _context.SaveChangesAsync();");
                w.line("return entity;");
            });
            w.blank();
            w.braced(format!("public async Task DeleteAsync({} id)", id_type), |w| {
                w.line(format!("var entity = await _context.Set<{}>().FindAsync(id);", name));
                w.line("if (entity != null)");
                w.line("{");
                w.indent();
                w.line("_context.Remove(entity);");
                w.line("await _context.SaveChangesAsync();");
                w.dedent();
                w.line("}");
            });
        });
        w.finish()
    }

    fn service(&self, class: &EnhancedClass, package: &str) -> String {
        let name = class.name();
        let var = camel_case(name);
        let repository = self.type_name(class, Capability::Repository);
        let id_type = self.id_type(class);
        let behaviors = service_behaviors(class, &CRUD_METHODS);

        let mut w = SourceWriter::new(INDENT);
        w.line(format!("using {};", Self::namespace(package, "Entities")));
        w.line(format!("using {};", Self::namespace(package, "Repositories")));
        w.blank();
        w.line(format!("namespace {};", Self::namespace(package, "Services"))).blank();
        w.braced(format!("public class {}", self.type_name(class, Capability::Service)), |w| {
            w.line(format!("private readonly {} _repository;", repository)).blank();
            w.braced(
                format!("public {}({} repository)", self.type_name(class, Capability::Service), repository),
                |w| {
                    w.line("_repository = repository;");
                },
            );
            w.blank();
            w.line(format!("public Task<List<{}>> FindAllAsync() => _repository.FindAllAsync();", name));
            w.blank();
            w.braced(format!("public async Task<{}> FindByIdAsync({} id)", name, id_type), |w| {
                w.line(format!(
                    "return await _repository.FindByIdAsync(id) ?? throw new KeyNotFoundException($\"{} {{id}} not found\");",
                    name
                ));
            });
            w.blank();
            w.line(format!(
                "public Task<{}> SaveAsync({} {}) => _repository.SaveAsync({});",
                name, name, var, var
            ));
            w.blank();
            w.line(format!("public Task DeleteAsync({} id) => _repository.DeleteAsync(id);", id_type));
            w.blank();
            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    let method = format!("{}Async", pascal_case(&event.name));
                    if CRUD_METHODS.contains(&method.as_str()) {
                        continue;
                    }
                    w.braced(format!("public async Task<{}> {}({} id)", name, method, id_type), |w| {
                        w.line(format!("var {} = await FindByIdAsync(id);", var));
                        w.line(format!("{}.{}();", var, pascal_case(&event.name)));
                        w.line(format!("return await _repository.SaveAsync({});", var));
                    });
                    w.blank();
                }
            }
            for method in behaviors {
                w.braced(
                    format!(
                        "public {} {}({})",
                        self.map_type(&method.return_type),
                        pascal_case(&method.name),
                        self.parameters(method)
                    ),
                    |w| {
                        for logic in &method.logic {
                            w.line(format!("// {}", logic));
                        }
                        w.line("throw new NotImplementedException();");
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
        let id_type = self.id_type(class);

        let mut w = SourceWriter::new(INDENT);
        w.line("using Microsoft.AspNetCore.Mvc;");
        w.line(format!("using {};", Self::namespace(package, "Entities")));
        w.line(format!("using {};", Self::namespace(package, "Services")));
        w.blank();
        w.line(format!("namespace {};", Self::namespace(package, "Controllers"))).blank();
        w.line("[ApiController]");
        w.line(format!("[Route(\"api/{}\")]", kebab_case(&pluralize(name))));
        w.braced(
            format!("public class {} : ControllerBase", self.type_name(class, Capability::Controller)),
            |w| {
                w.line(format!("private readonly {} _service;", service)).blank();
                w.braced(
                    format!("public {}({} service)", self.type_name(class, Capability::Controller), service),
                    |w| {
                        w.line("_service = service;");
                    },
                );
                w.blank();
                w.line("[HttpGet]");
                w.line(format!(
                    "public async Task<ActionResult<List<{}>>> List() => await _service.FindAllAsync();",
                    name
                ));
                w.blank();
                w.line("[HttpGet(\"{id}\")]");
                w.line(format!(
                    "public async Task<ActionResult<{}>> Get({} id) => await _service.FindByIdAsync(id);",
                    name, id_type
                ));
                w.blank();
                w.line("[HttpPost]");
                w.line(format!(
                    "public async Task<ActionResult<{}>> Create({} {}) => await _service.SaveAsync({});",
                    name, name, var, var
                ));
                w.blank();
                w.line("[HttpDelete(\"{id}\")]");
                w.braced(format!("public async Task<IActionResult> Delete({} id)", id_type), |w| {
                    w.line("await _service.DeleteAsync(id);");
                    w.line("return NoContent();");
                });
                w.blank();
                if let Some(machine) = &class.state_machine {
                    for event in event_methods(machine) {
                        let action = pascal_case(&event.name);
                        if CRUD_METHODS.contains(&format!("{}Async", action).as_str()) {
                            continue;
                        }
                        w.line(format!("[HttpPost(\"{{id}}/{}\")]", kebab_case(&event.name)));
                        w.line(format!(
                            "public async Task<ActionResult<{}>> {}({} id) => await _service.{}Async(id);",
                            name, action, id_type, action
                        ));
                        w.blank();
                    }
                }
            },
        );
        w.finish()
    }

    fn migration(&self, class: &EnhancedClass, _package: &str) -> String {
        sql::create_table(class)
    }
}
