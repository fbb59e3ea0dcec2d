use crate::assessment::models::Language;

const PYTHON_TEMPLATE: &str = r#"# Write your solution here
def solution():
    # Your code here
    pass

# Test your solution
if __name__ == "__main__":
    result = solution()
    print(result)"#;

const CPP_TEMPLATE: &str = r#"#include <iostream>
#include <vector>
using namespace std;

// Write your solution here
int solution() {
    // Your code here
    return 0;
}

int main() {
    int result = solution();
    cout << result << endl;
    return 0;
}"#;

const JAVA_TEMPLATE: &str = r#"public class Solution {
    // Write your solution here
    public static int solution() {
        // Your code here
        return 0;
    }

    public static void main(String[] args) {
        int result = solution();
        System.out.println(result);
    }
}"#;

/// Starter code shown for a question that has not been submitted yet.
pub fn code_template(language: Language) -> &'static str {
    match language {
        Language::Python => PYTHON_TEMPLATE,
        Language::Cpp => CPP_TEMPLATE,
        Language::Java => JAVA_TEMPLATE,
    }
}

/// Formats remaining seconds as `MM:SS`. Minutes are not capped at 59.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
