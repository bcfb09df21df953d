//! PHP generator: Eloquent models and Laravel repositories, services,
//! API controllers and schema migrations

use std::collections::BTreeSet;
use std::path::PathBuf;

use super::generator::{event_methods, service_behaviors, state_literal};
use super::{table_name, Capability, CodeGenerator, SourceSyntax, SourceWriter, TypeToken};
use crate::core::{camel_case, pascal_case, screaming_snake_case, snake_case, AttributeNode, MethodNode};
use crate::model::{Cardinality, EnhancedClass, RelationshipDescriptor, StateMachine};

const INDENT: &str = "    ";
const SERVICE_METHODS: [&str; 5] = ["list", "get", "create", "update", "delete"];
const CONTROLLER_ACTIONS: [&str; 5] = ["index", "show", "store", "update", "destroy"];
/// Eloquent methods a transition must not shadow
const MODEL_METHODS: [&str; 8] = ["save", "delete", "update", "create", "fill", "push", "refresh", "replicate"];

/// Emits Laravel flavoured PHP
#[derive(Debug, Default, Clone, Copy)]
pub struct PhpGenerator;

impl PhpGenerator {
    pub fn new() -> Self {
        Self
    }

    fn namespace(package: &str, layer: &str) -> String {
        format!("{}\\{}", package, layer)
    }

    fn open(w: &mut SourceWriter, namespace: &str, uses: &BTreeSet<String>) {
        w.line("<?php").blank();
        w.line(format!("namespace {};", namespace)).blank();
        if !uses.is_empty() {
            for import in uses {
                w.line(format!("use {};", import));
            }
            w.blank();
        }
    }

    fn model_import(package: &str, name: &str) -> String {
        format!("{}\\{}", Self::namespace(package, "Models"), name)
    }

    /// Integer keys get Laravel's auto-increment `id()` column
    fn id_type(&self, class: &EnhancedClass) -> String {
        class
            .identifier()
            .map(|id| self.map_type(&id.type_name))
            .unwrap_or_else(|| "int".to_string())
    }

    fn parameters(&self, method: &MethodNode) -> String {
        method
            .parameters
            .iter()
            .map(|p| format!("{} ${}", self.map_type(&p.type_name), camel_case(&p.name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Model imports for class-typed parameters and return types
    fn named_imports(&self, methods: &[&MethodNode], package: &str, own: &str, uses: &mut BTreeSet<String>) {
        for method in methods {
            let tokens = method
                .parameters
                .iter()
                .map(|p| p.type_name.as_str())
                .chain(std::iter::once(method.return_type.as_str()));
            for token in tokens {
                if let TypeToken::Named(name) = TypeToken::classify(token) {
                    if name != own {
                        uses.insert(Self::model_import(package, name));
                    }
                }
            }
        }
    }

    fn state_constant(machine: &StateMachine, state: &str) -> String {
        format!("{}_{}", screaming_snake_case(&machine.field_name), state_literal(state))
    }

    fn cast(field: &AttributeNode) -> Option<&'static str> {
        match TypeToken::classify(&field.type_name) {
            TypeToken::Integer | TypeToken::Long => Some("integer"),
            TypeToken::Float => Some("float"),
            TypeToken::Decimal => Some("decimal:2"),
            TypeToken::Boolean => Some("boolean"),
            TypeToken::Date => Some("date"),
            TypeToken::DateTime => Some("datetime"),
            TypeToken::Collection(_) => Some("array"),
            TypeToken::Text | TypeToken::Uuid | TypeToken::Named(_) | TypeToken::Void => None,
        }
    }

    /// Validation rule for one request field
    fn rule(class: &EnhancedClass, field: &AttributeNode, presence: &str) -> String {
        let mut parts = vec![if field.nullable { "nullable" } else { presence }.to_string()];
        parts.push(
            match TypeToken::classify(&field.type_name) {
                TypeToken::Integer | TypeToken::Long => "integer",
                TypeToken::Float | TypeToken::Decimal => "numeric",
                TypeToken::Boolean => "boolean",
                TypeToken::Date | TypeToken::DateTime => "date",
                TypeToken::Uuid => "uuid",
                TypeToken::Collection(_) => "array",
                TypeToken::Text | TypeToken::Named(_) | TypeToken::Void => "string|max:255",
            }
            .to_string(),
        );
        if field.unique {
            parts.push(format!(
                "unique:{},{}",
                table_name(class.name()),
                snake_case(&field.name)
            ));
        }
        parts.join("|")
    }

    /// Eloquent relation method: return type and body
    fn relation(class: &EnhancedClass, relation: &RelationshipDescriptor) -> (&'static str, String) {
        let target = &relation.target;
        match relation.cardinality {
            Cardinality::ManyToOne => (
                "BelongsTo",
                match &relation.join_column {
                    Some(column) => format!("$this->belongsTo({}::class, '{}')", target, column),
                    None => format!("$this->belongsTo({}::class)", target),
                },
            ),
            Cardinality::OneToOne if relation.owner => (
                "BelongsTo",
                match &relation.join_column {
                    Some(column) => format!("$this->belongsTo({}::class, '{}')", target, column),
                    None => format!("$this->belongsTo({}::class)", target),
                },
            ),
            Cardinality::OneToOne => (
                "HasOne",
                match &relation.mapped_by {
                    Some(inverse) => format!("$this->hasOne({}::class, '{}_id')", target, snake_case(inverse)),
                    None => format!("$this->hasOne({}::class)", target),
                },
            ),
            Cardinality::OneToMany => (
                "HasMany",
                match &relation.mapped_by {
                    Some(inverse) => format!("$this->hasMany({}::class, '{}_id')", target, snake_case(inverse)),
                    None => format!("$this->hasMany({}::class)", target),
                },
            ),
            Cardinality::ManyToMany => {
                let pivot = relation
                    .join_table
                    .clone()
                    .unwrap_or_else(|| format!("{}_{}", snake_case(target), snake_case(class.name())));
                ("BelongsToMany", format!("$this->belongsToMany({}::class, '{}')", target, pivot))
            }
        }
    }

    fn enumeration(&self, class: &EnhancedClass, package: &str) -> String {
        let mut w = SourceWriter::new(INDENT);
        Self::open(&mut w, &Self::namespace(package, "Models"), &BTreeSet::new());
        w.braced(format!("enum {}: string", class.name()), |w| {
            for literal in &class.class.literals {
                let literal = state_literal(literal);
                w.line(format!("case {} = '{}';", literal, literal));
            }
        });
        w.finish()
    }

    fn interface(&self, class: &EnhancedClass, package: &str) -> String {
        let methods: Vec<&MethodNode> = class.class.methods.iter().collect();
        let mut uses = BTreeSet::new();
        self.named_imports(&methods, package, class.name(), &mut uses);
        let mut w = SourceWriter::new(INDENT);
        Self::open(&mut w, &Self::namespace(package, "Models"), &uses);
        w.braced(format!("interface {}", class.name()), |w| {
            for method in &methods {
                w.line(format!(
                    "public function {}({}): {};",
                    camel_case(&method.name),
                    self.parameters(method),
                    self.map_type(&method.return_type)
                ));
            }
        });
        w.finish()
    }

    fn transition(&self, w: &mut SourceWriter, machine: &StateMachine, name: &str, event: &str, from_to: &[(&str, &str)]) {
        let field = snake_case(&machine.field_name);
        w.braced(format!("public function {}(): void", name), |w| {
            for (idx, (from, to)) in from_to.iter().enumerate() {
                let keyword = if idx == 0 { "if" } else { "} elseif" };
                w.line(format!(
                    "{} ($this->{} === self::{}) {{",
                    keyword,
                    field,
                    Self::state_constant(machine, from)
                ));
                w.indent();
                w.line(format!("$this->{} = self::{};", field, Self::state_constant(machine, to)));
                w.dedent();
            }
            w.line("} else {");
            w.indent();
            w.line(format!(
                "throw new \\LogicException('Cannot {} from ' . $this->{});",
                event, field
            ));
            w.dedent();
            w.line("}");
        });
    }
}

impl CodeGenerator for PhpGenerator {
    fn language(&self) -> &'static str {
        "php"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["laravel"]
    }

    fn syntax(&self) -> SourceSyntax {
        SourceSyntax::Braces
    }

    fn default_package(&self) -> &'static str {
        "App"
    }

    fn output_path(&self, class: &EnhancedClass, capability: Capability, _package: &str) -> PathBuf {
        let name = self.type_name(class, capability);
        match capability {
            Capability::Entity => PathBuf::from(format!("app/Models/{}.php", name)),
            Capability::Repository => PathBuf::from(format!("app/Repositories/{}.php", name)),
            Capability::Service => PathBuf::from(format!("app/Services/{}.php", name)),
            Capability::Controller => PathBuf::from(format!("app/Http/Controllers/Api/{}.php", name)),
            Capability::Migration => PathBuf::from(format!(
                "database/migrations/0001_01_01_000000_create_{}_table.php",
                table_name(class.name())
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
            TypeToken::Text | TypeToken::Uuid => "string".to_string(),
            TypeToken::Integer | TypeToken::Long => "int".to_string(),
            TypeToken::Float => "float".to_string(),
            // Eloquent's decimal cast yields strings
            TypeToken::Decimal => "string".to_string(),
            TypeToken::Boolean => "bool".to_string(),
            TypeToken::Date | TypeToken::DateTime => "\\DateTimeInterface".to_string(),
            TypeToken::Void => "void".to_string(),
            TypeToken::Collection(_) => "array".to_string(),
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

        let name = class.name();
        let relations: Vec<(&RelationshipDescriptor, &'static str, String)> = class
            .relationships
            .iter()
            .map(|r| {
                let (kind, body) = Self::relation(class, r);
                (r, kind, body)
            })
            .collect();

        let mut uses: BTreeSet<String> = BTreeSet::from([
            "Illuminate\\Database\\Eloquent\\Factories\\HasFactory".to_string(),
        ]);
        if class.class.superclass.is_none() {
            uses.insert("Illuminate\\Database\\Eloquent\\Model".to_string());
        }
        for (_, kind, _) in &relations {
            uses.insert(format!("Illuminate\\Database\\Eloquent\\Relations\\{}", kind));
        }
        let methods: Vec<&MethodNode> = class.class.methods.iter().collect();
        self.named_imports(&methods, package, name, &mut uses);

        let mut fillable: Vec<String> = class
            .fields()
            .filter(|f| !f.identifier)
            .map(|f| snake_case(&f.name))
            .collect();
        fillable.extend(class.relationships.iter().filter_map(|r| r.join_column.clone()));
        let casts: Vec<(String, &'static str)> = class
            .fields()
            .filter(|f| !f.identifier)
            .filter_map(|f| Self::cast(f).map(|cast| (snake_case(&f.name), cast)))
            .collect();

        let mut header = String::new();
        if class.class.is_abstract {
            header.push_str("abstract ");
        }
        header.push_str(&format!(
            "class {} extends {}",
            name,
            class.class.superclass.as_deref().unwrap_or("Model")
        ));
        if !class.class.interfaces.is_empty() {
            header.push_str(&format!(" implements {}", class.class.interfaces.join(", ")));
        }

        let mut w = SourceWriter::new(INDENT);
        Self::open(&mut w, &Self::namespace(package, "Models"), &uses);
        w.braced(header, |w| {
            w.line("use HasFactory;").blank();

            if let Some(machine) = &class.state_machine {
                for state in &machine.states {
                    w.line(format!(
                        "public const {} = '{}';",
                        Self::state_constant(machine, state),
                        state_literal(state)
                    ));
                }
                w.blank();
            }

            if !class.class.is_abstract {
                w.line(format!("protected $table = '{}';", table_name(name))).blank();
            }
            if let Some(id) = class.identifier().filter(|id| snake_case(&id.name) != "id") {
                w.line(format!("protected $primaryKey = '{}';", snake_case(&id.name))).blank();
            }
            if self.id_type(class) == "string" {
                w.line("public $incrementing = false;").blank();
                w.line("protected $keyType = 'string';").blank();
            }

            w.line("protected $fillable = [");
            w.indent();
            for column in &fillable {
                w.line(format!("'{}',", column));
            }
            w.dedent();
            w.line("];").blank();

            if !casts.is_empty() {
                w.line("protected $casts = [");
                w.indent();
                for (column, cast) in &casts {
                    w.line(format!("'{}' => '{}',", column, cast));
                }
                w.dedent();
                w.line("];").blank();
            }

            if let Some(machine) = &class.state_machine {
                w.line("protected $attributes = [");
                w.indent();
                w.line(format!(
                    "'{}' => self::{},",
                    snake_case(&machine.field_name),
                    Self::state_constant(machine, &machine.initial)
                ));
                w.dedent();
                w.line("];").blank();
            }

            let mut taken: BTreeSet<String> = BTreeSet::new();
            for (relation, kind, body) in &relations {
                let method = camel_case(&relation.field_name);
                taken.insert(method.clone());
                w.braced(format!("public function {}(): {}", method, kind), |w| {
                    w.line(format!("return {};", body));
                });
                w.blank();
            }

            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    if MODEL_METHODS.contains(&event.name.as_str()) || !taken.insert(event.name.clone()) {
                        continue;
                    }
                    let from_to: Vec<(&str, &str)> = event
                        .transitions
                        .iter()
                        .map(|t| (t.from.as_str(), t.to.as_str()))
                        .collect();
                    self.transition(w, machine, &event.name, event.event, &from_to);
                    w.blank();
                }
            }

            for method in methods {
                let method_name = camel_case(&method.name);
                if MODEL_METHODS.contains(&method_name.as_str()) || !taken.insert(method_name.clone()) {
                    continue;
                }
                let modifiers = if method.is_static { "public static" } else { "public" };
                let signature = format!(
                    "function {}({}): {}",
                    method_name,
                    self.parameters(method),
                    self.map_type(&method.return_type)
                );
                if method.is_abstract && class.class.is_abstract {
                    w.line(format!("abstract {} {};", modifiers, signature));
                } else {
                    w.braced(format!("{} {}", modifiers, signature), |w| {
                        w.line("throw new \\BadMethodCallException('Not implemented');");
                    });
                }
                w.blank();
            }
        });
        w.finish()
    }

    fn repository(&self, class: &EnhancedClass, package: &str) -> String {
        let name = class.name();
        let var = camel_case(name);
        let id_type = self.id_type(class);
        let uses = BTreeSet::from([
            Self::model_import(package, name),
            "Illuminate\\Database\\Eloquent\\Collection".to_string(),
        ]);

        let mut w = SourceWriter::new(INDENT);
        Self::open(&mut w, &Self::namespace(package, "Repositories"), &uses);
        w.braced(format!("class {}", self.type_name(class, Capability::Repository)), |w| {
            w.braced("public function all(): Collection", |w| {
                w.line(format!("return {}::all();", name));
            });
            w.blank();
            w.braced(format!("public function find({} $id): ?{}", id_type, name), |w| {
                w.line(format!("return {}::find($id);", name));
            });
            w.blank();
            for field in class.fields().filter(|f| f.unique && !f.identifier) {
                let param = camel_case(&field.name);
                w.braced(
                    format!(
                        "public function findBy{}({} ${}): ?{}",
                        pascal_case(&field.name),
                        self.map_type(&field.type_name),
                        param,
                        name
                    ),
                    |w| {
                        w.line(format!(
                            "return {}::where('{}', ${})->first();",
                            name,
                            snake_case(&field.name),
                            param
                        ));
                    },
                );
                w.blank();
            }
            if let Some(machine) = &class.state_machine {
                let field = snake_case(&machine.field_name);
                w.braced(
                    format!("public function findBy{}(string ${}): Collection", pascal_case(&machine.field_name), field),
                    |w| {
                        w.line(format!("return {}::where('{}', ${})->get();", name, field, field));
                    },
                );
                w.blank();
            }
            w.braced(format!("public function create(array $attributes): {}", name), |w| {
                w.line(format!("return {}::create($attributes);", name));
            });
            w.blank();
            w.braced(format!("public function save({} ${}): {}", name, var, name), |w| {
                w.line(format!("${}->save();", var));
                w.line(format!("return ${};", var));
            });
            w.blank();
            w.braced(format!("public function update({} ${}, array $attributes): {}", name, var, name), |w| {
                w.line(format!("${}->update($attributes);", var));
                w.line(format!("return ${};", var));
            });
            w.blank();
            w.braced(format!("public function delete({} ${}): void", name, var), |w| {
                w.line(format!("${}->delete();", var));
            });
        });
        w.finish()
    }

    fn service(&self, class: &EnhancedClass, package: &str) -> String {
        let name = class.name();
        let var = camel_case(name);
        let repository = self.type_name(class, Capability::Repository);
        let id_type = self.id_type(class);
        let behaviors = service_behaviors(class, &SERVICE_METHODS);

        let mut uses = BTreeSet::from([
            Self::model_import(package, name),
            format!("{}\\{}", Self::namespace(package, "Repositories"), repository),
            "Illuminate\\Database\\Eloquent\\Collection".to_string(),
            "Illuminate\\Database\\Eloquent\\ModelNotFoundException".to_string(),
        ]);
        self.named_imports(&behaviors, package, name, &mut uses);

        let mut w = SourceWriter::new(INDENT);
        Self::open(&mut w, &Self::namespace(package, "Services"), &uses);
        w.braced(format!("class {}", self.type_name(class, Capability::Service)), |w| {
            w.braced(format!("public function __construct(private {} $repository)", repository), |_| {});
            w.blank();
            w.braced("public function list(): Collection", |w| {
                w.line("return $this->repository->all();");
            });
            w.blank();
            w.braced(format!("public function get({} $id): {}", id_type, name), |w| {
                w.line(format!("${} = $this->repository->find($id);", var));
                w.line(format!("if (${} === null) {{", var));
                w.indent();
                w.line(format!("throw (new ModelNotFoundException())->setModel({}::class, [$id]);", name));
                w.dedent();
                w.line("}");
                w.line(format!("return ${};", var));
            });
            w.blank();
            w.braced(format!("public function create(array $attributes): {}", name), |w| {
                w.line("return $this->repository->create($attributes);");
            });
            w.blank();
            w.braced(format!("public function update({} $id, array $attributes): {}", id_type, name), |w| {
                w.line("return $this->repository->update($this->get($id), $attributes);");
            });
            w.blank();
            w.braced(format!("public function delete({} $id): void", id_type), |w| {
                w.line("$this->repository->delete($this->get($id));");
            });
            w.blank();
            if let Some(machine) = &class.state_machine {
                for event in event_methods(machine) {
                    if SERVICE_METHODS.contains(&event.name.as_str()) || MODEL_METHODS.contains(&event.name.as_str()) {
                        continue;
                    }
                    w.braced(format!("public function {}({} $id): {}", event.name, id_type, name), |w| {
                        w.line(format!("${} = $this->get($id);", var));
                        w.line(format!("${}->{}();", var, event.name));
                        w.line(format!("return $this->repository->save(${});", var));
                    });
                    w.blank();
                }
            }
            for method in behaviors {
                w.braced(
                    format!(
                        "public function {}({}): {}",
                        camel_case(&method.name),
                        self.parameters(method),
                        self.map_type(&method.return_type)
                    ),
                    |w| {
                        for logic in &method.logic {
                            w.line(format!("// {}", logic));
                        }
                        w.line("throw new \\BadMethodCallException('Not implemented');");
                    },
                );
                w.blank();
            }
        });
        w.finish()
    }

    fn controller(&self, class: &EnhancedClass, package: &str) -> String {
        let name = class.name();
        let service = self.type_name(class, Capability::Service);
        let id_type = self.id_type(class);
        let fields: Vec<&AttributeNode> = class.fields().filter(|f| !f.identifier).collect();
        let uses = BTreeSet::from([
            "App\\Http\\Controllers\\Controller".to_string(),
            format!("{}\\{}", Self::namespace(package, "Services"), service),
            "Illuminate\\Http\\JsonResponse".to_string(),
            "Illuminate\\Http\\Request".to_string(),
        ]);

        let validate = |w: &mut SourceWriter, presence: &str| {
            w.line("$validated = $request->validate([");
            w.indent();
            for field in &fields {
                w.line(format!(
                    "'{}' => '{}',",
                    snake_case(&field.name),
                    Self::rule(class, field, presence)
                ));
            }
            w.dedent();
            w.line("]);");
        };

        let mut w = SourceWriter::new(INDENT);
        Self::open(&mut w, &Self::namespace(package, "Http\\Controllers\\Api"), &uses);
        w.braced(
            format!("class {} extends Controller", self.type_name(class, Capability::Controller)),
            |w| {
                w.braced(format!("public function __construct(private {} $service)", service), |_| {});
                w.blank();
                w.braced("public function index(): JsonResponse", |w| {
                    w.line("return response()->json($this->service->list());");
                });
                w.blank();
                w.braced(format!("public function show({} $id): JsonResponse", id_type), |w| {
                    w.line("return response()->json($this->service->get($id));");
                });
                w.blank();
                w.braced("public function store(Request $request): JsonResponse", |w| {
                    validate(w, "required");
                    w.line("return response()->json($this->service->create($validated), 201);");
                });
                w.blank();
                w.braced(format!("public function update(Request $request, {} $id): JsonResponse", id_type), |w| {
                    validate(w, "sometimes");
                    w.line("return response()->json($this->service->update($id, $validated));");
                });
                w.blank();
                w.braced(format!("public function destroy({} $id): JsonResponse", id_type), |w| {
                    w.line("$this->service->delete($id);");
                    w.line("return response()->json(null, 204);");
                });
                w.blank();
                if let Some(machine) = &class.state_machine {
                    for event in event_methods(machine) {
                        let taken = CONTROLLER_ACTIONS.contains(&event.name.as_str())
                            || SERVICE_METHODS.contains(&event.name.as_str())
                            || MODEL_METHODS.contains(&event.name.as_str());
                        if taken {
                            continue;
                        }
                        w.braced(format!("public function {}({} $id): JsonResponse", event.name, id_type), |w| {
                            w.line(format!("return response()->json($this->service->{}($id));", event.name));
                        });
                        w.blank();
                    }
                }
            },
        );
        w.finish()
    }

    fn migration(&self, class: &EnhancedClass, _package: &str) -> String {
        let table = table_name(class.name());
        let mut columns: Vec<String> = Vec::new();

        match class.identifier() {
            Some(id) if id.name == "id" && self.id_type(class) == "int" => columns.push("$table->id();".to_string()),
            Some(_) => {}
            None => columns.push("$table->id();".to_string()),
        }
        for field in class.fields() {
            let column = snake_case(&field.name);
            if field.identifier && column == "id" && self.id_type(class) == "int" {
                continue;
            }
            let mut line = match TypeToken::classify(&field.type_name) {
                TypeToken::Integer => format!("$table->integer('{}')", column),
                TypeToken::Long => format!("$table->bigInteger('{}')", column),
                TypeToken::Float => format!("$table->double('{}')", column),
                TypeToken::Decimal => format!("$table->decimal('{}', 19, 2)", column),
                TypeToken::Boolean => format!("$table->boolean('{}')", column),
                TypeToken::Date => format!("$table->date('{}')", column),
                TypeToken::DateTime => format!("$table->timestamp('{}')", column),
                TypeToken::Uuid => format!("$table->uuid('{}')", column),
                TypeToken::Collection(_) => format!("$table->json('{}')", column),
                TypeToken::Text | TypeToken::Named(_) | TypeToken::Void => format!("$table->string('{}')", column),
            };
            if field.identifier {
                line.push_str("->primary()");
            } else {
                if field.nullable {
                    line.push_str("->nullable()");
                }
                if field.unique {
                    line.push_str("->unique()");
                }
            }
            line.push(';');
            columns.push(line);
        }
        for relation in class.relationships.iter().filter(|r| r.owner) {
            let Some(join_column) = &relation.join_column else {
                continue;
            };
            let mut line = format!(
                "$table->foreignId('{}')->nullable()->constrained('{}')",
                join_column,
                table_name(&relation.target)
            );
            if relation.cascade_delete {
                line.push_str("->cascadeOnDelete()");
            }
            if relation.cardinality == Cardinality::OneToOne {
                line.push_str("->unique()");
            }
            line.push(';');
            columns.push(line);
        }
        if let Some(machine) = &class.state_machine {
            columns.push(format!(
                "$table->string('{}', 32)->default('{}');",
                snake_case(&machine.field_name),
                state_literal(&machine.initial)
            ));
        }
        columns.push("$table->timestamps();".to_string());

        let pivots: Vec<(&String, &String)> = class
            .relationships
            .iter()
            .filter(|r| r.owner)
            .filter_map(|r| r.join_table.as_ref().map(|pivot| (pivot, &r.target)))
            .collect();

        let mut w = SourceWriter::new(INDENT);
        w.line("<?php").blank();
        w.line("use Illuminate\\Database\\Migrations\\Migration;");
        w.line("use Illuminate\\Database\\Schema\\Blueprint;");
        w.line("use Illuminate\\Support\\Facades\\Schema;");
        w.blank();
        w.line("return new class extends Migration");
        w.line("{");
        w.indent();
        w.braced("public function up(): void", |w| {
            w.line(format!("Schema::create('{}', function (Blueprint $table) {{", table));
            w.indent();
            w.lines(&columns);
            w.dedent();
            w.line("});");
            for (pivot, target) in &pivots {
                w.blank();
                w.line(format!("Schema::create('{}', function (Blueprint $table) {{", pivot));
                w.indent();
                w.line(format!(
                    "$table->foreignId('{}_id')->constrained('{}')->cascadeOnDelete();",
                    snake_case(class.name()),
                    table
                ));
                w.line(format!(
                    "$table->foreignId('{}_id')->constrained('{}')->cascadeOnDelete();",
                    snake_case(target),
                    table_name(target)
                ));
                w.line(format!(
                    "$table->primary(['{}_id', '{}_id']);",
                    snake_case(class.name()),
                    snake_case(target)
                ));
                w.dedent();
                w.line("});");
            }
        });
        w.blank();
        w.braced("public function down(): void", |w| {
            for (pivot, _) in pivots.iter().rev() {
                w.line(format!("Schema::dropIfExists('{}');", pivot));
            }
            w.line(format!("Schema::dropIfExists('{}');", table));
        });
        w.dedent();
        w.line("};");
        w.finish()
    }
}
