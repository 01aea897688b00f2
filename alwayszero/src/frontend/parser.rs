use {
    crate::frontend::{
        attributes::AttributeRegistry,
        lexer::{Lexer, Span, Token, TokenKind},
        ParseError,
    },
    common::{
        arena::Ref,
        intern::InternedString,
        ir::{
            attribute::{Attribute, AttributeArgument},
            block::Block,
            constant_value::{Constant, ConstantValue},
            function::{Function, Symbol},
            statement::{
                build, BinaryOperationKind, CallTarget, Operand, Statement, UnaryOperationKind,
                Variable,
            },
            types::{PrimitiveType, Type},
            Declaration, Model,
        },
        HashMap,
    },
    core::fmt::{self, Display, Formatter},
    log::trace,
};

/// Parses `source` into a model, applying attributes through `attributes`
pub fn parse(source: &str, attributes: &AttributeRegistry) -> Result<Model, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let items = Parser::new(tokens).parse_module()?;
    lower(items, attributes)
}

struct Item {
    span: Span,
    attributes: Vec<(Attribute, Span)>,
    name: String,
    parameters: Vec<Parameter>,
    return_type: Option<Type>,
    body: Option<Body>,
}

struct Parameter {
    span: Span,
    name: Option<String>,
    typ: Type,
}

struct Body {
    locals: Vec<(String, Type, Span)>,
    blocks: Vec<RawBlock>,
}

struct RawBlock {
    label: Label,
    statements: Vec<RawStatement>,
}

struct Label {
    name: String,
    span: Span,
}

#[derive(Debug, Clone, Copy)]
enum Literal {
    Integer { negative: bool, magnitude: u64 },
    Float(f64),
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer {
                negative: true,
                magnitude,
            } => write!(f, "-{magnitude}"),
            Self::Integer { magnitude, .. } => write!(f, "{magnitude}"),
            Self::Float(v) => write!(f, "{v:?}"),
        }
    }
}

enum RawOperand {
    Name(String, Span),
    Literal {
        value: Literal,
        typ: Option<Type>,
        span: Span,
    },
}

enum Callee {
    Direct(String, Span),
    Indirect(RawOperand),
}

enum RawValue {
    Operand(RawOperand),
    Unary(UnaryOperationKind, RawOperand),
    Binary(BinaryOperationKind, RawOperand, RawOperand),
    Call(Callee, Vec<RawOperand>),
    Phi(Vec<(Label, RawOperand)>),
}

enum RawStatement {
    Define {
        destination: String,
        span: Span,
        value: RawValue,
    },
    Call {
        callee: Callee,
        args: Vec<RawOperand>,
    },
    Jump(Label),
    Branch {
        condition: RawOperand,
        true_target: Label,
        false_target: Label,
    },
    Return(Option<RawOperand>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse_module(&mut self) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();

        while !self.check(&TokenKind::Eof) {
            items.push(self.parse_item()?);
        }

        Ok(items)
    }

    fn parse_item(&mut self) -> Result<Item, ParseError> {
        let mut attributes = Vec::new();
        while self.check(&TokenKind::AttributeStart) {
            attributes.push(self.parse_attribute()?);
        }

        let span = self.span();
        self.expect(&TokenKind::Fn)?;
        let name = self.expect_ident()?;

        self.expect(&TokenKind::LParen)?;
        let mut parameters = Vec::new();
        while !self.check(&TokenKind::RParen) {
            if !parameters.is_empty() {
                self.expect(&TokenKind::Comma)?;
            }
            parameters.push(self.parse_parameter()?);
        }
        self.expect(&TokenKind::RParen)?;

        let return_type = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = if self.eat(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_body()?)
        };

        Ok(Item {
            span,
            attributes,
            name,
            parameters,
            return_type,
            body,
        })
    }

    fn parse_attribute(&mut self) -> Result<(Attribute, Span), ParseError> {
        let span = self.span();
        self.expect(&TokenKind::AttributeStart)?;
        let name = self.expect_ident()?;

        let mut args = Vec::new();
        if self.eat(&TokenKind::LParen) {
            while !self.check(&TokenKind::RParen) {
                if !args.is_empty() {
                    self.expect(&TokenKind::Comma)?;
                }
                args.push(self.parse_attribute_argument()?);
            }
            self.expect(&TokenKind::RParen)?;
        }
        self.expect(&TokenKind::RBracket)?;

        Ok((Attribute::new(InternedString::new(name), args), span))
    }

    fn parse_attribute_argument(&mut self) -> Result<AttributeArgument, ParseError> {
        let span = self.span();
        let negative = self.eat(&TokenKind::Minus);

        match self.advance().kind {
            TokenKind::String(s) if !negative => Ok(AttributeArgument::String(s.into())),
            TokenKind::Ident(s) if !negative => Ok(AttributeArgument::Identifier(s.into())),
            TokenKind::Integer(magnitude) => {
                let value = if negative {
                    -i128::from(magnitude)
                } else {
                    i128::from(magnitude)
                };
                i64::try_from(value)
                    .map(AttributeArgument::Integer)
                    .map_err(|_| ParseError::new(span, "attribute argument out of range"))
            }
            other => Err(ParseError::new(
                span,
                format!("expected attribute argument, found {other}"),
            )),
        }
    }

    /// `name: type` or, in declarations without a body, a bare type
    fn parse_parameter(&mut self) -> Result<Parameter, ParseError> {
        let span = self.span();

        let name = match (self.peek_kind(), self.peek_kind_at(1)) {
            (TokenKind::Ident(_), TokenKind::Colon) => {
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Colon)?;
                Some(name)
            }
            _ => None,
        };

        Ok(Parameter {
            span,
            name,
            typ: self.parse_type()?,
        })
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        let span = self.span();

        if self.eat(&TokenKind::Star) {
            return Ok(self.parse_type()?.pointer_to());
        }

        let name = self.expect_ident()?;
        Type::from_primitive_name(&name)
            .ok_or_else(|| ParseError::new(span, format!("unknown type `{name}`")))
    }

    fn parse_body(&mut self) -> Result<Body, ParseError> {
        self.expect(&TokenKind::LBrace)?;

        let mut locals = Vec::new();
        while self.check(&TokenKind::Let) {
            self.advance();
            let span = self.span();
            let name = self.expect_ident()?;
            self.expect(&TokenKind::Colon)?;
            let typ = self.parse_type()?;
            self.expect(&TokenKind::Semicolon)?;
            locals.push((name, typ, span));
        }

        let mut blocks = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let label = self.parse_label()?;
            self.expect(&TokenKind::Colon)?;

            let mut statements = Vec::new();
            while !self.at_block_boundary() {
                statements.push(self.parse_statement()?);
            }

            blocks.push(RawBlock { label, statements });
        }

        if blocks.is_empty() {
            return Err(self.error("function body has no blocks"));
        }

        self.expect(&TokenKind::RBrace)?;

        Ok(Body { locals, blocks })
    }

    fn at_block_boundary(&self) -> bool {
        matches!(
            (self.peek_kind(), self.peek_kind_at(1)),
            (TokenKind::RBrace | TokenKind::Eof, _) | (TokenKind::Ident(_), TokenKind::Colon)
        )
    }

    fn parse_label(&mut self) -> Result<Label, ParseError> {
        let span = self.span();
        Ok(Label {
            name: self.expect_ident()?,
            span,
        })
    }

    fn parse_statement(&mut self) -> Result<RawStatement, ParseError> {
        let statement = match self.peek_kind() {
            TokenKind::Call => {
                self.advance();
                let (callee, args) = self.parse_call()?;
                RawStatement::Call { callee, args }
            }
            TokenKind::Jump => {
                self.advance();
                RawStatement::Jump(self.parse_label()?)
            }
            TokenKind::Branch => {
                self.advance();
                let condition = self.parse_operand()?;
                self.expect(&TokenKind::Comma)?;
                let true_target = self.parse_label()?;
                self.expect(&TokenKind::Comma)?;
                let false_target = self.parse_label()?;
                RawStatement::Branch {
                    condition,
                    true_target,
                    false_target,
                }
            }
            TokenKind::Return => {
                self.advance();
                if self.check(&TokenKind::Semicolon) {
                    RawStatement::Return(None)
                } else {
                    RawStatement::Return(Some(self.parse_operand()?))
                }
            }
            TokenKind::Ident(_) => {
                let span = self.span();
                let destination = self.expect_ident()?;
                self.expect(&TokenKind::Eq)?;
                RawStatement::Define {
                    destination,
                    span,
                    value: self.parse_value()?,
                }
            }
            other => return Err(self.error(&format!("expected statement, found {other}"))),
        };

        self.expect(&TokenKind::Semicolon)?;

        Ok(statement)
    }

    fn parse_value(&mut self) -> Result<RawValue, ParseError> {
        if self.eat(&TokenKind::Call) {
            let (callee, args) = self.parse_call()?;
            return Ok(RawValue::Call(callee, args));
        }

        if self.eat(&TokenKind::Phi) {
            let mut members = Vec::new();
            loop {
                self.expect(&TokenKind::LBracket)?;
                let label = self.parse_label()?;
                self.expect(&TokenKind::Colon)?;
                let value = self.parse_operand()?;
                self.expect(&TokenKind::RBracket)?;
                members.push((label, value));

                self.eat(&TokenKind::Comma);
                if !self.check(&TokenKind::LBracket) {
                    return Ok(RawValue::Phi(members));
                }
            }
        }

        // a mnemonic is only an operator when an operand follows it
        if let TokenKind::Ident(mnemonic) = self.peek_kind() {
            let operand_follows = matches!(
                self.peek_kind_at(1),
                TokenKind::Ident(_) | TokenKind::Integer(_) | TokenKind::Float(_) | TokenKind::Minus
            );

            if operand_follows {
                if let Some(kind) = UnaryOperationKind::ALL
                    .into_iter()
                    .find(|k| k.mnemonic() == mnemonic)
                {
                    self.advance();
                    return Ok(RawValue::Unary(kind, self.parse_operand()?));
                }

                if let Some(kind) = BinaryOperationKind::ALL
                    .into_iter()
                    .find(|k| k.mnemonic() == mnemonic)
                {
                    self.advance();
                    let lhs = self.parse_operand()?;
                    self.expect(&TokenKind::Comma)?;
                    let rhs = self.parse_operand()?;
                    return Ok(RawValue::Binary(kind, lhs, rhs));
                }

                return Err(self.error(&format!("unknown operation `{mnemonic}`")));
            }
        }

        Ok(RawValue::Operand(self.parse_operand()?))
    }

    fn parse_call(&mut self) -> Result<(Callee, Vec<RawOperand>), ParseError> {
        let callee = if self.eat(&TokenKind::Star) {
            Callee::Indirect(self.parse_operand()?)
        } else {
            let span = self.span();
            Callee::Direct(self.expect_ident()?, span)
        };

        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            if !args.is_empty() {
                self.expect(&TokenKind::Comma)?;
            }
            args.push(self.parse_operand()?);
        }
        self.expect(&TokenKind::RParen)?;

        Ok((callee, args))
    }

    fn parse_operand(&mut self) -> Result<RawOperand, ParseError> {
        let span = self.span();
        let negative = self.eat(&TokenKind::Minus);

        let value = match self.advance().kind {
            TokenKind::Ident(name) if !negative => return Ok(RawOperand::Name(name, span)),
            TokenKind::Integer(magnitude) => Literal::Integer {
                negative,
                magnitude,
            },
            TokenKind::Float(v) => Literal::Float(if negative { -v } else { v }),
            other => {
                return Err(ParseError::new(
                    span,
                    format!("expected operand, found {other}"),
                ))
            }
        };

        let typ = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        Ok(RawOperand::Literal { value, typ, span })
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek_kind_at(0)
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind.clone())
            .unwrap_or(TokenKind::Eof)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_default()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.peek_kind()) == core::mem::discriminant(kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens.get(self.pos).cloned().unwrap_or(Token {
            kind: TokenKind::Eof,
            span: self.span(),
        });

        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }

        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(&format!("expected {kind}, found {}", self.peek_kind())))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.peek_kind() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error(&format!("expected identifier, found {other}"))),
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::new(self.span(), message)
    }
}

fn lower(items: Vec<Item>, attributes: &AttributeRegistry) -> Result<Model, ParseError> {
    let mut model = Model::new();

    // declarations first so calls may refer to functions defined further down
    for item in &items {
        let name = InternedString::new(&item.name);

        if model.declarations().contains_key(&name) {
            return Err(ParseError::new(
                item.span,
                format!("function `{name}` declared more than once"),
            ));
        }

        let mut declaration = Declaration::new(
            name,
            item.return_type.clone(),
            item.parameters.iter().map(|p| p.typ.clone()).collect(),
        );

        for (attribute, span) in &item.attributes {
            attributes
                .apply(&mut declaration, attribute.clone())
                .map_err(|e| ParseError::new(*span, e.to_string()))?;
        }

        model.add_declaration(declaration);
    }

    for item in items {
        let Some(body) = item.body else {
            continue;
        };

        let function = FunctionLowering::new(model.declarations(), &item.name, item.return_type)
            .lower(item.parameters, body)?;

        trace!("lowered {}", function.name());
        model.add_function(function);
    }

    Ok(model)
}

struct FunctionLowering<'m> {
    declarations: &'m HashMap<InternedString, Declaration>,
    name: InternedString,
    return_type: Option<Type>,
    labels: HashMap<String, Ref<Block>>,
}

impl<'m> FunctionLowering<'m> {
    fn new(
        declarations: &'m HashMap<InternedString, Declaration>,
        name: &str,
        return_type: Option<Type>,
    ) -> Self {
        Self {
            declarations,
            name: InternedString::new(name),
            return_type,
            labels: HashMap::default(),
        }
    }

    fn lower(mut self, parameters: Vec<Parameter>, body: Body) -> Result<Function, ParseError> {
        let parameters = parameters
            .into_iter()
            .map(|p| match p.name {
                Some(name) => Ok(Symbol::new(InternedString::new(name), p.typ)),
                None => Err(ParseError::new(
                    p.span,
                    format!("parameters of `{}` must be named", self.name),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut function = Function::new(self.name, self.return_type.clone(), parameters);

        for (name, typ, span) in body.locals {
            let name = InternedString::new(name);
            if function.get_local_variable(name).is_some() || function.get_parameter(name).is_some()
            {
                return Err(ParseError::new(
                    span,
                    format!("`{name}` declared more than once"),
                ));
            }
            function.add_local_variable(Symbol::new(name, typ));
        }

        // the first label names the entry block
        for (index, block) in body.blocks.iter().enumerate() {
            let r = if index == 0 {
                function.entry_block()
            } else {
                function.new_block()
            };

            if self.labels.insert(block.label.name.clone(), r).is_some() {
                return Err(ParseError::new(
                    block.label.span,
                    format!("block `{}` defined more than once", block.label.name),
                ));
            }
        }

        for block in body.blocks {
            let r = self.label(&block.label)?;

            for statement in block.statements {
                let statement = self.lower_statement(&function, statement)?;
                build(r, function.arena_mut(), statement);
            }
        }

        Ok(function)
    }

    fn label(&self, label: &Label) -> Result<Ref<Block>, ParseError> {
        self.labels.get(&label.name).copied().ok_or_else(|| {
            ParseError::new(label.span, format!("unknown block `{}`", label.name))
        })
    }

    /// Parameters and declared locals by their full name are unversioned,
    /// otherwise `local_N` is version `N` of `local`
    fn variable(&self, function: &Function, name: &str, span: Span) -> Result<Variable, ParseError> {
        let interned = InternedString::new(name);

        if let Some(symbol) = function
            .get_parameter(interned)
            .or_else(|| function.get_local_variable(interned))
        {
            return Ok(Variable::unversioned(symbol));
        }

        if let Some((base, version)) = name.rsplit_once('_') {
            if let (Ok(version), Some(symbol)) = (
                version.parse::<u32>(),
                function.get_local_variable(InternedString::new(base)),
            ) {
                return Ok(Variable::new(symbol, Some(version)));
            }
        }

        Err(ParseError::new(span, format!("unknown variable `{name}`")))
    }

    fn operand(
        &self,
        function: &Function,
        operand: &RawOperand,
        expected: Option<&Type>,
    ) -> Result<Operand, ParseError> {
        match operand {
            RawOperand::Name(name, span) => self
                .variable(function, name, *span)
                .map(Operand::Variable),
            RawOperand::Literal { value, typ, span } => {
                let Some(typ) = typ.as_ref().or(expected) else {
                    return Err(ParseError::new(
                        *span,
                        format!("cannot infer the type of `{value}`, write `{value}:<type>`"),
                    ));
                };

                constant(*value, typ, *span).map(Operand::Constant)
            }
        }
    }

    /// Type of an operand when it can be known without context
    fn operand_type(&self, function: &Function, operand: &RawOperand) -> Option<Type> {
        match operand {
            RawOperand::Name(name, span) => {
                self.variable(function, name, *span).ok().map(|v| v.typ())
            }
            RawOperand::Literal { typ, .. } => typ.clone(),
        }
    }

    fn lower_statement(
        &self,
        function: &Function,
        statement: RawStatement,
    ) -> Result<Statement, ParseError> {
        Ok(match statement {
            RawStatement::Define {
                destination,
                span,
                value,
            } => {
                let destination = self.variable(function, &destination, span)?;
                let typ = destination.typ();

                match value {
                    RawValue::Operand(value) => Statement::Assign {
                        value: self.operand(function, &value, Some(&typ))?,
                        destination,
                    },
                    RawValue::Unary(kind, value) => Statement::UnaryOperation {
                        kind,
                        value: self.operand(function, &value, Some(&typ))?,
                        destination,
                    },
                    RawValue::Binary(kind, lhs, rhs) => {
                        let expected = if kind.is_comparison() {
                            self.operand_type(function, &lhs)
                                .or_else(|| self.operand_type(function, &rhs))
                        } else {
                            Some(typ)
                        };

                        Statement::BinaryOperation {
                            kind,
                            lhs: self.operand(function, &lhs, expected.as_ref())?,
                            rhs: self.operand(function, &rhs, expected.as_ref())?,
                            destination,
                        }
                    }
                    RawValue::Call(callee, args) => {
                        self.lower_call(function, Some(destination), span, callee, args)?
                    }
                    RawValue::Phi(members) => Statement::Phi {
                        members: members
                            .iter()
                            .map(|(label, value)| {
                                Ok((self.label(label)?, self.operand(function, value, Some(&typ))?))
                            })
                            .collect::<Result<_, ParseError>>()?,
                        destination,
                    },
                }
            }
            RawStatement::Call { callee, args } => {
                let span = match &callee {
                    Callee::Direct(_, span)
                    | Callee::Indirect(RawOperand::Name(_, span))
                    | Callee::Indirect(RawOperand::Literal { span, .. }) => *span,
                };
                self.lower_call(function, None, span, callee, args)?
            }
            RawStatement::Jump(target) => Statement::Jump {
                target: self.label(&target)?,
            },
            RawStatement::Branch {
                condition,
                true_target,
                false_target,
            } => Statement::Branch {
                condition: self.operand(function, &condition, Some(&Type::u1()))?,
                true_target: self.label(&true_target)?,
                false_target: self.label(&false_target)?,
            },
            RawStatement::Return(value) => Statement::Return {
                value: value
                    .map(|v| self.operand(function, &v, self.return_type.as_ref()))
                    .transpose()?,
            },
        })
    }

    fn lower_call(
        &self,
        function: &Function,
        destination: Option<Variable>,
        span: Span,
        callee: Callee,
        args: Vec<RawOperand>,
    ) -> Result<Statement, ParseError> {
        match callee {
            Callee::Direct(name, name_span) => {
                let Some(declaration) = self.declarations.get(&InternedString::new(&name)) else {
                    return Err(ParseError::new(
                        name_span,
                        format!("call to undeclared function `{name}`"),
                    ));
                };

                if declaration.parameters().len() != args.len() {
                    return Err(ParseError::new(
                        name_span,
                        format!(
                            "`{name}` takes {} arguments but {} were supplied",
                            declaration.parameters().len(),
                            args.len()
                        ),
                    ));
                }

                if destination.is_some() && declaration.return_type().is_none() {
                    return Err(ParseError::new(
                        span,
                        format!("`{name}` does not return a value"),
                    ));
                }

                let args = args
                    .iter()
                    .zip(declaration.parameters())
                    .map(|(arg, typ)| self.operand(function, arg, Some(typ)))
                    .collect::<Result<_, _>>()?;

                Ok(Statement::Call {
                    destination,
                    target: CallTarget::Direct(declaration.name()),
                    args,
                    return_type: declaration.return_type(),
                })
            }
            Callee::Indirect(pointer) => {
                let pointer = self.operand(function, &pointer, None)?;
                let args = args
                    .iter()
                    .map(|arg| self.operand(function, arg, None))
                    .collect::<Result<_, _>>()?;

                Ok(Statement::Call {
                    return_type: destination.as_ref().map(Variable::typ),
                    destination,
                    target: CallTarget::Indirect(pointer),
                    args,
                })
            }
        }
    }
}

fn constant(literal: Literal, typ: &Type, span: Span) -> Result<Constant, ParseError> {
    let mismatch = || ParseError::new(span, format!("`{literal}` is not a valid {typ}"));

    let value = match (literal, typ) {
        (
            Literal::Integer {
                negative: false,
                magnitude,
            },
            Type::Primitive(PrimitiveType::UnsignedInteger(_)) | Type::Pointer(_),
        ) => ConstantValue::UnsignedInteger(magnitude),
        (
            Literal::Integer {
                negative,
                magnitude,
            },
            Type::Primitive(PrimitiveType::SignedInteger(_)),
        ) => {
            let value = if negative {
                -i128::from(magnitude)
            } else {
                i128::from(magnitude)
            };
            ConstantValue::SignedInteger(i64::try_from(value).map_err(|_| mismatch())?)
        }
        (
            Literal::Integer {
                negative,
                magnitude,
            },
            Type::Primitive(PrimitiveType::FloatingPoint(_)),
        ) => {
            let value = magnitude as f64;
            ConstantValue::FloatingPoint(if negative { -value } else { value })
        }
        (Literal::Float(value), Type::Primitive(PrimitiveType::FloatingPoint(_))) => {
            ConstantValue::FloatingPoint(value)
        }
        _ => return Err(mismatch()),
    };

    if !value.fits(typ) {
        return Err(mismatch());
    }

    Ok(Constant::new(typ.clone(), value))
}

#[cfg(test)]
mod tests {
    use {
        super::parse,
        crate::{frontend::AttributeRegistry, plugin::registrar::register_attributes},
        common::{
            intern::InternedString,
            ir::{
                attribute::AttributeArgument,
                constant_value::ConstantValue,
                statement::{CallTarget, Operand, Statement},
                types::Type,
            },
        },
        pretty_assertions::assert_eq,
    };

    fn registry() -> AttributeRegistry {
        let mut registry = AttributeRegistry::new();
        register_attributes(&mut registry).unwrap();
        registry
    }

    const SCENARIO: &str = r#"
#[user("alwayszero")]
fn bar() -> i32;

fn foo() -> i32 {
    let x: i32;
    let y: i32;
bb0:
    x_1 = call bar();
    y_1 = add x_1, 1;
    return y_1;
}
"#;

    #[test]
    fn scenario_round_trips() {
        let model = parse(SCENARIO, &registry()).unwrap();

        assert_eq!(model.to_string(), SCENARIO.trim_start());
    }

    #[test]
    fn attributes_attached() {
        let model = parse(SCENARIO, &registry()).unwrap();
        let bar = &model.declarations()[&InternedString::from_static("bar")];

        assert_eq!(bar.attributes().len(), 1);
        assert_eq!(bar.attributes()[0].name(), "user");
        assert_eq!(
            bar.attributes()[0].args(),
            &[AttributeArgument::String("alwayszero".into())]
        );
        assert!(model.functions().get(&bar.name()).is_none());
    }

    #[test]
    fn unknown_attribute_ignored() {
        let model = parse("#[cold] fn f();", &registry()).unwrap();

        assert!(model.declarations()[&InternedString::from_static("f")]
            .attributes()
            .is_empty());
    }

    #[test]
    fn malformed_user_attribute_rejected() {
        for source in [
            "#[user] fn f();",
            "#[user()] fn f();",
            "#[user(\"a\", \"b\")] fn f();",
            "#[user(1)] fn f();",
            "#[user(alwayszero)] fn f();",
        ] {
            let err = parse(source, &registry()).unwrap_err();
            assert_eq!((err.line, err.column), (1, 1), "{source}");
        }
    }

    #[test]
    fn literal_types_inferred() {
        let source = r#"
fn g(i8, f64) -> u1;

fn f(a: i64) {
    let c: u1;
    let d: u1;
bb0:
    c_1 = call g(-3, 2);
    d_1 = cmp-lt a, -1;
    branch c_1, bb1, bb0;
bb1:
    return;
}
"#;
        let model = parse(source, &registry()).unwrap();
        let f = &model.functions()[&InternedString::from_static("f")];
        let entry = f.entry_block().get(f.arena());
        let statements = entry
            .statements()
            .iter()
            .map(|s| s.get(entry.arena()).clone())
            .collect::<Vec<_>>();

        let Statement::Call { args, .. } = &statements[0] else {
            panic!("expected call, got {}", statements[0]);
        };
        assert_eq!(args[0].typ(), Type::s8());
        assert_eq!(args[1].typ(), Type::f64());
        let Operand::Constant(c) = &args[1] else {
            panic!()
        };
        assert_eq!(c.value(), ConstantValue::FloatingPoint(2.0));

        let Statement::BinaryOperation { rhs, .. } = &statements[1] else {
            panic!("expected comparison, got {}", statements[1]);
        };
        assert_eq!(rhs.typ(), Type::s64());
        assert_eq!(statements[1].typ(), Some(Type::u1()));
    }

    #[test]
    fn indirect_calls() {
        let source = r#"
fn f(p: *i32) -> i32 {
    let r: i32;
bb0:
    r_1 = call *p(1:i32);
    return r_1;
}
"#;
        let model = parse(source, &registry()).unwrap();
        let f = &model.functions()[&InternedString::from_static("f")];
        let entry = f.entry_block().get(f.arena());
        let call = entry.statements()[0].get(entry.arena());

        assert!(matches!(
            call,
            Statement::Call {
                target: CallTarget::Indirect(_),
                return_type: Some(_),
                ..
            }
        ));
        assert_eq!(call.to_string(), "r_1 = call *p(1)");
    }

    #[test]
    fn versioned_compiler_temporaries() {
        let source = r#"
fn bar() -> i32;

fn f() -> i32 {
    let dummy_var.0: i32;
bb0:
    dummy_var.0_2 = call bar();
    return dummy_var.0_2;
}
"#;
        let model = parse(source, &registry()).unwrap();
        let f = &model.functions()[&InternedString::from_static("f")];
        let entry = f.entry_block().get(f.arena());
        let destination = entry.statements()[0]
            .get(entry.arena())
            .destination()
            .cloned()
            .unwrap();

        assert_eq!(destination.name(), "dummy_var.0");
        assert_eq!(destination.version(), Some(2));
    }

    #[test]
    fn errors() {
        let cases = [
            ("fn f() { bb0: call nope(); return; }", "undeclared"),
            ("fn f() { bb0: x_1 = 1; return; }", "unknown variable"),
            ("fn f() { bb0: jump bb7; }", "unknown block"),
            ("fn f(i32) { bb0: return; }", "must be named"),
            ("fn f() -> u8 { bb0: return 300; }", "not a valid u8"),
            ("fn f() -> i32 { let c: u1; bb0: c_1 = cmp-eq 1, 2; return 0; }", "infer"),
            ("fn f(); fn f();", "more than once"),
            ("fn f() {}", "no blocks"),
            ("fn f() -> q32;", "unknown type"),
        ];

        for (source, message) in cases {
            let err = parse(source, &registry()).unwrap_err();
            assert!(
                err.message.contains(message),
                "{source}: expected {message:?}, got {err}"
            );
        }
    }
}
