//! Top-level declaration emission: structs, interfaces, functions.

use crate::frontend::ast::{
    Declaration, FunctionDecl, InterfaceDecl, MethodSig, Param, TypeDecl, TypeExpr,
};

use super::generics::GenericsMap;
use super::Generator;

impl Generator<'_> {
    pub(super) fn gen_declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Type(t) => self.gen_type_decl(t),
            Declaration::Interface(i) => self.gen_interface_decl(i),
            Declaration::Function(f) => self.gen_function_decl(f),
        }
    }

    fn gen_type_decl(&mut self, decl: &TypeDecl) {
        self.push_line(&format!("type {} struct {{", decl.name));
        self.indent += 1;
        for field in &decl.fields {
            let ty = self.go_type(&field.ty);
            match &field.alias {
                Some(alias) => {
                    self.push_line(&format!("{} {} `json:\"{}\"`", field.name, ty, alias))
                }
                None => self.push_line(&format!("{} {}", field.name, ty)),
            }
        }
        self.indent -= 1;
        self.push_line("}");
    }

    fn gen_interface_decl(&mut self, decl: &InterfaceDecl) {
        self.push_line(&format!("type {} interface {{", decl.name));
        self.indent += 1;
        for method in &decl.methods {
            let line = self.method_sig(method);
            self.push_line(&line);
        }
        self.indent -= 1;
        self.push_line("}");
    }

    fn method_sig(&self, sig: &MethodSig) -> String {
        format!(
            "{}({}){}",
            sig.name,
            self.param_list(&sig.params),
            self.returns_suffix(&sig.returns),
        )
    }

    fn gen_function_decl(&mut self, f: &FunctionDecl) {
        // Per-function generation state.
        self.temp_count = 0;
        self.current_returns = f.returns.clone();
        self.current_receiver = f.receiver.as_ref().map(|r| r.name.clone());
        self.generics = GenericsMap::for_function(f, &self.options.source_path);

        let receiver = match &f.receiver {
            Some(recv) => format!("({} {}) ", recv.name, self.go_type(&recv.ty)),
            None => String::new(),
        };
        let type_params = self
            .generics
            .as_ref()
            .map(|g| g.param_list())
            .unwrap_or_default();

        let header = format!(
            "func {receiver}{}{type_params}({}){} {{",
            f.name,
            self.param_list(&f.params),
            self.returns_suffix(&f.returns),
        );
        self.push_line(&header);
        self.indent += 1;
        self.gen_block(&f.body);
        self.indent -= 1;
        self.push_line("}");

        self.current_receiver = None;
        self.generics = None;
        self.current_returns = Vec::new();
    }

    fn param_list(&self, params: &[Param]) -> String {
        let rendered: Vec<String> = params
            .iter()
            .map(|p| format!("{} {}", p.name, self.go_type(&p.ty)))
            .collect();
        rendered.join(", ")
    }

    pub(super) fn returns_suffix(&self, returns: &[TypeExpr]) -> String {
        match returns.len() {
            0 => String::new(),
            1 => format!(" {}", self.go_type(&returns[0])),
            _ => {
                let rendered: Vec<String> = returns.iter().map(|r| self.go_type(r)).collect();
                format!(" ({})", rendered.join(", "))
            }
        }
    }
}
