//! Python generator: Django models, repositories, services and views

use std::path::PathBuf;

use super::generator::{event_methods, service_behaviors, state_literal};
use super::{sql, table_name, Capability, CodeGenerator, SourceSyntax, SourceWriter, TypeToken};
use crate::core::{pascal_case, snake_case, split_words, MethodNode};
use crate::model::{Cardinality, EnhancedClass, RelationshipDescriptor};

const INDENT: &str = "    ";
const CRUD_METHODS: [&str; 4] = ["list", "get", "save", "delete"];

/// Emits Django flavoured Python
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonGenerator;

impl PythonGenerator {
    pub fn new() -> Self {
        Self
    }

    fn module(class: &str) -> String {
        snake_case(class)
    }

    fn label(literal: &str) -> String {
        split_words(literal)
            .iter()
            .enumerate()
            .map(|(idx, word)| {
                let lower = word.to_lowercase();
                if idx == 0 {
                    pascal_case(&lower)
                } else {
                    lower
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn parameters(&self, method: &MethodNode) -> String {
        let receiver = (!method.is_static).then(|| "self".to_string());
        receiver
            .into_iter()
            .chain(
                method
                    .parameters
                    .iter()
                    .map(|p| format!("{}: {}", snake_case(&p.name), self.map_type(&p.type_name))),
            )
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn returns(&self, method: &MethodNode) -> String {
        let ty = self.map_type(&method.return_type);
        if ty == "None" || ty.contains('[') || ty.chars().next().is_some_and(char::is_lowercase) {
            ty
        } else {
            format!("\"{}\"", ty)
        }
    }

    fn model_field(&self, token: &str, nullable: bool, unique: bool, identifier: bool) -> String {
        let (kind, mut options): (&str, Vec<String>) = match TypeToken::classify(token) {
            TypeToken::Integer if identifier => ("AutoField", vec![]),
            TypeToken::Long if identifier => ("BigAutoField", vec![]),
            TypeToken::Text | TypeToken::Named(_) | TypeToken::Void => {
                ("CharField", vec!["max_length=255".to_string()])
            }
            TypeToken::Integer => ("IntegerField", vec![]),
            TypeToken::Long => ("BigIntegerField", vec![]),
            TypeToken::Float => ("FloatField", vec![]),
            TypeToken::Decimal => (
                "DecimalField",
                vec!["max_digits=19".to_string(), "decimal_places=2".to_string()],
            ),
            TypeToken::Boolean => ("BooleanField", vec![]),
            TypeToken::Date => ("DateField", vec![]),
            TypeToken::DateTime => ("DateTimeField", vec![]),
            TypeToken::Uuid => ("UUIDField", vec![]),
            TypeToken::Collection(_) => ("JSONField", vec!["default=list".to_string()]),
        };
        if identifier {
            options.push("primary_key=True".to_string());
        } else {
            if nullable {
                options.push("null=True".to_string());
                options.push("blank=True".to_string());
            }
            if unique {
                options.push("unique=True".to_string());
            }
        }
        format!("models.{}({})", kind, options.join(", "))
    }

    fn relationship_field(&self, relation: &RelationshipDescriptor) -> String {
        let mut options = vec![format!("\"{}\"", relation.target)];
        let kind = match relation.cardinality {
            Cardinality::ManyToMany => {
                if let Some(table) = &relation.join_table {
                    options.push(format!("db_table=\"{}\"", table));
                }
                "ManyToManyField"
            }
            Cardinality::OneToOne | Cardinality::ManyToOne | Cardinality::OneToMany => {
                let on_delete = if relation.cascade_delete {
                    "models.CASCADE"
                } else {
                    "models.PROTECT"
                };
                options.push(format!("on_delete={}", on_delete));
                if let Some(column) = &relation.join_column {
                    options.push(format!("db_column=\"{}\"", column));
                }
                if relation.cardinality == Cardinality::OneToOne {
                    "OneToOneField"
                } else {
                    "ForeignKey"
                }
            }
        };
        if let Some(inverse) = &relation.inversed_by {
            options.push(format!("related_name=\"{}\"", snake_case(inverse)));
        }
        format!("models.{}({})", kind, options.join(", "))
    }
}

impl CodeGenerator for PythonGenerator {
    fn language(&self) -> &'static str {
        "python"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["django"]
    }

    fn syntax(&self) -> SourceSyntax {
        SourceSyntax::Indentation
    }

    fn default_package(&self) -> &'static str {
        "app"
    }

    fn output_path(&self, class: &EnhancedClass, capability: Capability, package: &str) -> PathBuf {
        let mut path: PathBuf = package.split('.').filter(|s| !s.is_empty()).collect();
        let module = Self::module(class.name());
        match capability {
            Capability::Entity => path.push(format!("models/{}.py", module)),
            Capability::Repository => path.push(format!("repositories/{}_repository.py", module)),
            Capability::Service => path.push(format!("services/{}_service.py", module)),
            Capability::Controller => path.push(format!("views/{}_views.py", module)),
            Capability::Migration => path.push(format!("migrations/{}.sql", table_name(class.name()))),
        }
        path
    }

    fn type_name(&self, class: &EnhancedClass, capability: Capability) -> String {
        match capability {
            Capability::Entity | Capability::Migration => class.name().to_string(),
            Capability::Controller => format!("{}View", class.name()),
            other => format!("{}{}", class.name(), pascal_case(other.as_str())),
        }
    }

    fn map_type(&self, token: &str) -> String {
        match TypeToken::classify(token) {
            TypeToken::Text => "str".to_string(),
            TypeToken::Integer | TypeToken::Long => "int".to_string(),
            TypeToken::Float => "float".to_string(),
            TypeToken::Decimal => "Decimal".to_string(),
            TypeToken::Boolean => "bool".to_string(),
            TypeToken::Date => "date".to_string(),
            TypeToken::DateTime => "datetime".to_string(),
            TypeToken::Uuid => "UUID".to_string(),
            TypeToken::Void => "None".to_string(),
            TypeToken::Collection(inner) => format!("list[{}]", self.map_type(inner)),
            TypeToken::Named(name) => name.to_string(),
        }
    }

    fn entity(&self, class: &EnhancedClass, _package: &str) -> String {
        let mut w = SourceWriter::new(INDENT);
        w.line("from django.db import models");

        if class.is_enumeration() {
            w.blank().line("");
            w.suite(format!("class {}(models.TextChoices):", class.name()), |w| {
                for literal in &class.class.literals {
                    let value = state_literal(literal);
                    w.line(format!("{} = \"{}\", \"{}\"", value, value, Self::label(literal)));
                }
                if class.class.literals.is_empty() {
                    w.line("pass");
                }
            });
            return w.finish();
        }

        let machine = class.state_machine.as_ref();
        if let Some(machine) = machine.filter(|m| !m.embedded_enum) {
            w.line(format!(
                "from .{} import {}",
                Self::module(&machine.enum_name),
                machine.enum_name
            ));
        }
        if let Some(parent) = &class.class.superclass {
            w.line(format!("from .{} import {}", Self::module(parent), parent));
        }
        w.blank().line("");

        if let Some(machine) = machine.filter(|m| m.embedded_enum) {
            w.suite(format!("class {}(models.TextChoices):", machine.enum_name), |w| {
                for state in &machine.states {
                    let value = state_literal(state);
                    w.line(format!("{} = \"{}\", \"{}\"", value, value, Self::label(state)));
                }
            });
            w.blank().line("");
        }

        let base = class
            .class
            .superclass
            .clone()
            .unwrap_or_else(|| "models.Model".to_string());
        w.suite(format!("class {}({}):", class.name(), base), |w| {
            let mut empty = true;
            for field in class.fields() {
                w.line(format!(
                    "{} = {}",
                    snake_case(&field.name),
                    self.model_field(&field.type_name, field.nullable, field.unique, field.identifier)
                ));
                empty = false;
            }
            for relation in class.relationships.iter().filter(|r| r.owner) {
                w.line(format!(
                    "{} = {}",
                    snake_case(&relation.field_name),
                    self.relationship_field(relation)
                ));
                empty = false;
            }
            if let Some(machine) = machine {
                w.line(format!(
                    "{} = models.CharField(max_length=32, choices={}.choices, default={}.{})",
                    snake_case(&machine.field_name),
                    machine.enum_name,
                    machine.enum_name,
                    state_literal(&machine.initial)
                ));
                empty = false;
            }
            if !empty {
                w.blank();
            }
            w.suite("class Meta:", |w| {
                if class.class.is_abstract {
                    w.line("abstract = True");
                } else {
                    w.line(format!("db_table = \"{}\"", table_name(class.name())));
                }
            });
            w.blank();

            if let Some(machine) = machine {
                let field = snake_case(&machine.field_name);
                for event in event_methods(machine) {
                    w.suite(format!("def {}(self) -> None:", snake_case(&event.name)), |w| {
                        for (idx, transition) in event.transitions.iter().enumerate() {
                            let keyword = if idx == 0 { "if" } else { "elif" };
                            w.suite(
                                format!(
                                    "{} self.{} == {}.{}:",
                                    keyword,
                                    field,
                                    machine.enum_name,
                                    state_literal(&transition.from)
                                ),
                                |w| {
                                    w.line(format!(
                                        "self.{} = {}.{}",
                                        field,
                                        machine.enum_name,
                                        state_literal(&transition.to)
                                    ));
                                },
                            );
                        }
                        w.suite("else:", |w| {
                            w.line(format!(
                                "raise ValueError(f\"Cannot {} from {{self.{}}}\")",
                                event.event, field
                            ));
                        });
                    });
                    w.blank();
                }
            }

            for method in &class.class.methods {
                if method.is_static {
                    w.line("@staticmethod");
                }
                w.suite(
                    format!(
                        "def {}({}) -> {}:",
                        snake_case(&method.name),
                        self.parameters(method),
                        self.returns(method)
                    ),
                    |w| {
                        w.line("raise NotImplementedError");
                    },
                );
                w.blank();
            }
        });
        w.finish()
    }

    fn repository(&self, class: &EnhancedClass, _package: &str) -> String {
        let name = class.name();
        let mut w = SourceWriter::new(INDENT);
        w.line(format!("from ..models.{} import {}", Self::module(name), name));
        w.blank().line("");
        w.suite(format!("class {}:", self.type_name(class, Capability::Repository)), |w| {
            w.suite(format!("def list(self) -> list[{}]:", name), |w| {
                w.line(format!("return list({}.objects.all())", name));
            });
            w.blank();
            w.suite(format!("def get(self, pk) -> {} | None:", name), |w| {
                w.line(format!("return {}.objects.filter(pk=pk).first()", name));
            });
            w.blank();
            for field in class.fields().filter(|f| f.unique && !f.identifier) {
                let field_name = snake_case(&field.name);
                w.suite(
                    format!(
                        "def get_by_{}(self, {}: {}) -> {} | None:",
                        field_name,
                        field_name,
                        self.map_type(&field.type_name),
                        name
                    ),
                    |w| {
                        w.line(format!("return {}.objects.filter({}={}).first()", name, field_name, field_name));
                    },
                );
                w.blank();
            }
            w.suite(format!("def save(self, instance: {}) -> {}:", name, name), |w| {
                w.line("instance.save()");
                w.line("return instance");
            });
            w.blank();
            w.suite("def delete(self, pk) -> None:", |w| {
                w.line(format!("{}.objects.filter(pk=pk).delete()", name));
            });
        });
        w.finish()
    }

    fn service(&self, class: &EnhancedClass, _package: &str) -> String {
        let name = class.name();
        let var = snake_case(name);
        let repository = self.type_name(class, Capability::Repository);
        let behaviors = service_behaviors(class, &CRUD_METHODS);

        let mut w = SourceWriter::new(INDENT);
        w.line(format!("from ..models.{} import {}", Self::module(name), name));
        w.line(format!(
            "from ..repositories.{}_repository import {}",
            Self::module(name),
            repository
        ));
        w.blank().line("");
        w.suite(format!("class {}:", self.type_name(class, Capability::Service)), |w| {
            w.suite(format!("def __init__(self, repository: {} | None = None) -> None:", repository), |w| {
                w.line(format!("self.repository = repository or {}()", repository));
            });
            w.blank();
            w.suite(format!("def list(self) -> list[{}]:", name), |w| {
                w.line("return self.repository.list()");
            });
            w.blank();
            w.suite(format!("def get(self, pk) -> {}:", name), |w| {
                w.line(format!("{} = self.repository.get(pk)", var));
                w.suite(format!("if {} is None:", var), |w| {
                    w.line(format!("raise {}.DoesNotExist(f\"{} {{pk}} not found\")", name, name));
                });
                w.line(format!("return {}", var));
            });
            w.blank();
            w.suite(format!("def save(self, {}: {}) -> {}:", var, name, name), |w| {
                w.line(format!("return self.repository.save({})", var));
            });
            w.blank();
            w.suite("def delete(self, pk) -> None:", |w| {
                w.line("self.repository.delete(pk)");
            });
            w.blank();
            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    let method = snake_case(&event.name);
                    if CRUD_METHODS.contains(&method.as_str()) {
                        continue;
                    }
                    w.suite(format!("def {}(self, pk) -> {}:", method, name), |w| {
                        w.line(format!("{} = self.get(pk)", var));
                        w.line(format!("{}.{}()", var, method));
                        w.line(format!("return self.repository.save({})", var));
                    });
                    w.blank();
                }
            }
            for method in behaviors {
                w.suite(
                    format!(
                        "def {}({}) -> {}:",
                        snake_case(&method.name),
                        self.parameters(method),
                        self.returns(method)
                    ),
                    |w| {
                        for logic in &method.logic {
                            w.line(format!("# {}", logic));
                        }
                        w.line("raise NotImplementedError");
                    },
                );
                w.blank();
            }
        });
        w.finish()
    }

    fn controller(&self, class: &EnhancedClass, _package: &str) -> String {
        let name = class.name();
        let service = self.type_name(class, Capability::Service);
        let mut w = SourceWriter::new(INDENT);
        w.line("import json");
        w.blank();
        w.line("from django.forms.models import model_to_dict");
        w.line("from django.http import HttpResponse, JsonResponse");
        w.line("from django.views import View");
        w.blank();
        w.line(format!("from ..models.{} import {}", Self::module(name), name));
        w.line(format!("from ..services.{}_service import {}", Self::module(name), service));
        w.blank().line("");
        w.suite(format!("class {}(View):", self.type_name(class, Capability::Controller)), |w| {
            w.line(format!("service = {}()", service));
            w.blank();
            w.suite("def get(self, request, pk=None):", |w| {
                w.suite("if pk is None:", |w| {
                    w.line("return JsonResponse([model_to_dict(item) for item in self.service.list()], safe=False)");
                });
                w.line("return JsonResponse(model_to_dict(self.service.get(pk)))");
            });
            w.blank();
            w.suite("def post(self, request):", |w| {
                w.line(format!("instance = {}(**json.loads(request.body))", name));
                w.line("return JsonResponse(model_to_dict(self.service.save(instance)), status=201)");
            });
            w.blank();
            w.suite("def delete(self, request, pk):", |w| {
                w.line("self.service.delete(pk)");
                w.line("return HttpResponse(status=204)");
            });
            w.blank();
            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    let method = snake_case(&event.name);
                    if CRUD_METHODS.contains(&method.as_str()) {
                        continue;
                    }
                    w.suite(format!("def {}(self, request, pk):", method), |w| {
                        w.line(format!("return JsonResponse(model_to_dict(self.service.{}(pk)))", method));
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
    use pretty_assertions::assert_eq;

    #[test]
    fn test_model_fields() {
        let mut class = ClassNode::new("Invoice");
        class.attributes.push(AttributeNode::new("number", "String"));
        class.attributes.push(AttributeNode::new("totalAmount", "Float"));
        let source = PythonGenerator::new().entity(&EnhancedClass::new(class), "billing");
        assert_eq!(
            source,
            "from django.db import models\n\n\nclass Invoice(models.Model):\n    number = models.CharField(max_length=255)\n    total_amount = models.FloatField()\n\n    class Meta:\n        db_table = \"invoices\"\n"
        );
    }

    #[test]
    fn test_state_machine_is_text_choices() {
        let block = StateBlock {
            initial: Some("Draft".into()),
            states: vec!["Draft".into(), "InReview".into()],
            transitions: vec![StateTransition {
                from: "Draft".into(),
                event: "submit".into(),
                to: "InReview".into(),
            }],
            ..Default::default()
        };
        let mut class = EnhancedClass::new(ClassNode::new("Post"));
        class.state_machine = StateMachine::from_block(&block, "PostStatus");
        let source = PythonGenerator::new().entity(&class, "app");
        assert!(source.contains("class PostStatus(models.TextChoices):\n    DRAFT = \"DRAFT\", \"Draft\"\n    IN_REVIEW = \"IN_REVIEW\", \"In review\"\n"));
        assert!(source.contains("status = models.CharField(max_length=32, choices=PostStatus.choices, default=PostStatus.DRAFT)"));
        assert!(source.contains("    def submit(self) -> None:\n        if self.status == PostStatus.DRAFT:\n            self.status = PostStatus.IN_REVIEW\n        else:\n"));
    }

    #[test]
    fn test_paths() {
        let python = PythonGenerator::new();
        let class = EnhancedClass::new(ClassNode::new("OrderLine"));
        assert_eq!(
            python.output_path(&class, Capability::Entity, "shop"),
            PathBuf::from("shop/models/order_line.py")
        );
        assert_eq!(
            python.output_path(&class, Capability::Controller, "shop"),
            PathBuf::from("shop/views/order_line_views.py")
        );
    }
}
